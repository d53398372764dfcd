use crate::error::{PggeomError, Result};
use crate::geometry::Geometry;
use crate::model::{
    GeometryCollection, GeometryValue, Head, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Number(f64),
    LParen,
    RParen,
    Comma,
    Semi,
    Eq,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Word(w) => format!("`{w}`"),
            Token::Number(n) => format!("number {n}"),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::Semi => "`;`".to_string(),
            Token::Eq => "`=`".to_string(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>> {
    let mut out = Vec::new();
    let mut it = input.char_indices().peekable();
    while let Some(&(at, c)) = it.peek() {
        match c {
            c if c.is_whitespace() => {
                it.next();
            }
            '(' => {
                out.push((Token::LParen, at));
                it.next();
            }
            ')' => {
                out.push((Token::RParen, at));
                it.next();
            }
            ',' => {
                out.push((Token::Comma, at));
                it.next();
            }
            ';' => {
                out.push((Token::Semi, at));
                it.next();
            }
            '=' => {
                out.push((Token::Eq, at));
                it.next();
            }
            c if c.is_ascii_digit() || matches!(c, '.' | '-' | '+') => {
                let mut text = String::new();
                while let Some(&(_, c)) = it.peek() {
                    if c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E') {
                        text.push(c);
                        it.next();
                    } else {
                        break;
                    }
                }
                let n = text.parse::<f64>().map_err(|_| {
                    PggeomError::Wkt(format!("invalid number `{text}` at offset {at}"))
                })?;
                out.push((Token::Number(n), at));
            }
            c if c.is_ascii_alphabetic() => {
                let mut text = String::new();
                while let Some(&(_, c)) = it.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        text.push(c);
                        it.next();
                    } else {
                        break;
                    }
                }
                out.push((Token::Word(text), at));
            }
            c => {
                return Err(PggeomError::Wkt(format!(
                    "unexpected character `{c}` at offset {at}"
                )));
            }
        }
    }
    Ok(out)
}

/// Parse a WKT or EWKT string into a geometry value.
pub(crate) fn parse(input: &str) -> Result<GeometryValue> {
    let mut parser = WktParser {
        tokens: tokenize(input)?,
        pos: 0,
        end: input.len(),
    };
    let srid = parser.parse_srid_prefix()?;
    let mut value = parser.parse_tagged()?;
    if parser.pos < parser.tokens.len() {
        return Err(PggeomError::Wkt(format!(
            "unexpected trailing {} at offset {}",
            parser.tokens[parser.pos].0.describe(),
            parser.at()
        )));
    }
    value.head_mut().srid = srid;
    Ok(value)
}

struct WktParser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end: usize,
}

impl WktParser {
    fn at(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, at)| *at)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn peek_word(&self) -> Option<&str> {
        match self.peek() {
            Some(Token::Word(w)) => Some(w),
            _ => None,
        }
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<()> {
        match self.peek() {
            Some(t) if t == token => {
                self.bump();
                Ok(())
            }
            Some(t) => Err(PggeomError::Wkt(format!(
                "expected {what}, found {} at offset {}",
                t.describe(),
                self.at()
            ))),
            None => Err(PggeomError::Wkt(format!(
                "expected {what}, found end of input at offset {}",
                self.end
            ))),
        }
    }

    fn take_word(&mut self) -> Result<(String, usize)> {
        let at = self.at();
        match self.peek() {
            Some(Token::Word(w)) => {
                let w = w.clone();
                self.bump();
                Ok((w, at))
            }
            Some(t) => Err(PggeomError::Wkt(format!(
                "expected a geometry keyword, found {} at offset {at}",
                t.describe()
            ))),
            None => Err(PggeomError::Wkt(format!(
                "expected a geometry keyword, found end of input at offset {at}"
            ))),
        }
    }

    fn take_number(&mut self) -> Result<f64> {
        let at = self.at();
        match self.peek() {
            Some(Token::Number(n)) => {
                let n = *n;
                self.bump();
                Ok(n)
            }
            Some(t) => Err(PggeomError::Wkt(format!(
                "expected a number, found {} at offset {at}",
                t.describe()
            ))),
            None => Err(PggeomError::Wkt(format!(
                "expected a number, found end of input at offset {at}"
            ))),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn parse_srid_prefix(&mut self) -> Result<Option<i32>> {
        if !self
            .peek_word()
            .is_some_and(|w| w.eq_ignore_ascii_case("SRID"))
        {
            return Ok(None);
        }
        self.bump();
        self.expect(&Token::Eq, "`=`")?;
        let at = self.at();
        let n = self.take_number()?;
        if n.fract() != 0.0 || n < f64::from(i32::MIN) || n > f64::from(i32::MAX) {
            return Err(PggeomError::Wkt(format!(
                "invalid SRID value at offset {at}"
            )));
        }
        self.expect(&Token::Semi, "`;`")?;
        Ok(Some(n as i32))
    }

    /// One tagged geometry without an SRID prefix. Each call gets a fresh
    /// dimensionality context: the modifier when present, the first
    /// coordinate's arity otherwise.
    fn parse_tagged(&mut self) -> Result<GeometryValue> {
        let (word, at) = self.take_word()?;
        let keyword = word.to_ascii_uppercase();
        let modifier = self.parse_modifier();
        if self
            .peek_word()
            .is_some_and(|w| w.eq_ignore_ascii_case("EMPTY"))
        {
            return Err(PggeomError::Wkt(format!(
                "EMPTY geometries are not supported (offset {})",
                self.at()
            )));
        }
        let mut dims = modifier;
        let value = match keyword.as_str() {
            "POINT" => {
                self.expect(&Token::LParen, "`(`")?;
                let p = self.parse_coord(&mut dims)?;
                self.expect(&Token::RParen, "`)`")?;
                GeometryValue::Point(p)
            }
            "LINESTRING" => {
                let points = self.parse_coord_list(&mut dims)?;
                GeometryValue::LineString(LineString::from_raw(head_of(dims), points))
            }
            "POLYGON" => {
                let rings = self.parse_ring_list(&mut dims)?;
                GeometryValue::Polygon(Polygon::from_raw(head_of(dims), rings))
            }
            "MULTIPOINT" => {
                self.expect(&Token::LParen, "`(`")?;
                let mut points = vec![self.parse_multipoint_member(&mut dims)?];
                while self.eat(&Token::Comma) {
                    points.push(self.parse_multipoint_member(&mut dims)?);
                }
                self.expect(&Token::RParen, "`)`")?;
                GeometryValue::MultiPoint(MultiPoint::from_raw(head_of(dims), points))
            }
            "MULTILINESTRING" => {
                self.expect(&Token::LParen, "`(`")?;
                let mut lines = vec![self.parse_line_member(&mut dims)?];
                while self.eat(&Token::Comma) {
                    lines.push(self.parse_line_member(&mut dims)?);
                }
                self.expect(&Token::RParen, "`)`")?;
                GeometryValue::MultiLineString(MultiLineString::from_raw(head_of(dims), lines))
            }
            "MULTIPOLYGON" => {
                self.expect(&Token::LParen, "`(`")?;
                let mut polygons = vec![self.parse_polygon_member(&mut dims)?];
                while self.eat(&Token::Comma) {
                    polygons.push(self.parse_polygon_member(&mut dims)?);
                }
                self.expect(&Token::RParen, "`)`")?;
                GeometryValue::MultiPolygon(MultiPolygon::from_raw(head_of(dims), polygons))
            }
            "GEOMETRYCOLLECTION" => {
                self.expect(&Token::LParen, "`(`")?;
                let mut members = vec![Geometry::from(self.parse_tagged()?)];
                while self.eat(&Token::Comma) {
                    members.push(Geometry::from(self.parse_tagged()?));
                }
                self.expect(&Token::RParen, "`)`")?;
                let gc = GeometryCollection::new(members, None)?;
                if let Some(dims) = modifier {
                    if (gc.dimz(), gc.dimm()) != dims {
                        return Err(PggeomError::Wkt(format!(
                            "collection modifier does not match its members (offset {at})"
                        )));
                    }
                }
                GeometryValue::GeometryCollection(gc)
            }
            _ => {
                return Err(PggeomError::Wkt(format!(
                    "unknown geometry keyword `{word}` at offset {at}"
                )));
            }
        };
        Ok(value)
    }

    fn parse_modifier(&mut self) -> Option<(bool, bool)> {
        let dims = match self.peek_word()?.to_ascii_uppercase().as_str() {
            "Z" => (true, false),
            "M" => (false, true),
            "ZM" => (true, true),
            _ => return None,
        };
        self.bump();
        Some(dims)
    }

    /// One coordinate: 2 to 4 numbers. The first coordinate of a geometry
    /// without a modifier fixes the arity; three numbers mean X, Y, Z.
    fn parse_coord(&mut self, dims: &mut Option<(bool, bool)>) -> Result<Point> {
        let at = self.at();
        let mut nums = Vec::new();
        while matches!(self.peek(), Some(Token::Number(_))) {
            nums.push(self.take_number()?);
        }
        let (dimz, dimm) = match *dims {
            Some((dimz, dimm)) => {
                let want = 2 + usize::from(dimz) + usize::from(dimm);
                if nums.len() != want {
                    return Err(PggeomError::Wkt(format!(
                        "coordinate at offset {at} has {} values, expected {want}",
                        nums.len()
                    )));
                }
                (dimz, dimm)
            }
            None => {
                let inferred = match nums.len() {
                    2 => (false, false),
                    3 => (true, false),
                    4 => (true, true),
                    n => {
                        return Err(PggeomError::Wkt(format!(
                            "coordinate at offset {at} has {n} values, expected 2 to 4"
                        )));
                    }
                };
                *dims = Some(inferred);
                inferred
            }
        };
        Point::with_dims(&nums, dimz, dimm, None)
    }

    fn parse_coord_list(&mut self, dims: &mut Option<(bool, bool)>) -> Result<Vec<Point>> {
        self.expect(&Token::LParen, "`(`")?;
        let mut points = vec![self.parse_coord(dims)?];
        while self.eat(&Token::Comma) {
            points.push(self.parse_coord(dims)?);
        }
        self.expect(&Token::RParen, "`)`")?;
        Ok(points)
    }

    fn parse_ring_list(&mut self, dims: &mut Option<(bool, bool)>) -> Result<Vec<LineString>> {
        self.expect(&Token::LParen, "`(`")?;
        let mut rings = vec![self.parse_line_member(dims)?];
        while self.eat(&Token::Comma) {
            rings.push(self.parse_line_member(dims)?);
        }
        self.expect(&Token::RParen, "`)`")?;
        Ok(rings)
    }

    fn parse_line_member(&mut self, dims: &mut Option<(bool, bool)>) -> Result<LineString> {
        let points = self.parse_coord_list(dims)?;
        Ok(LineString::from_raw(head_of(*dims), points))
    }

    fn parse_polygon_member(&mut self, dims: &mut Option<(bool, bool)>) -> Result<Polygon> {
        let rings = self.parse_ring_list(dims)?;
        Ok(Polygon::from_raw(head_of(*dims), rings))
    }

    /// A multipoint member is a coordinate with or without its own parens.
    fn parse_multipoint_member(&mut self, dims: &mut Option<(bool, bool)>) -> Result<Point> {
        if self.eat(&Token::LParen) {
            let p = self.parse_coord(dims)?;
            self.expect(&Token::RParen, "`)`")?;
            Ok(p)
        } else {
            self.parse_coord(dims)
        }
    }
}

fn head_of(dims: Option<(bool, bool)>) -> Head {
    let (dimz, dimm) = dims.unwrap_or((false, false));
    Head {
        srid: None,
        dimz,
        dimm,
    }
}
