use crate::dialect::Dialect;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// A registered parameter: either a value copied at registration time or a
/// shared reference read at compile time.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Value(Value),
    Bound(Rc<RefCell<Value>>),
}

impl ParamValue {
    /// The value as it is right now.
    pub fn current(&self) -> Value {
        match self {
            ParamValue::Value(v) => v.clone(),
            ParamValue::Bound(cell) => cell.borrow().clone(),
        }
    }
}

/// Named placeholders (e.g. `:id`) and their values.
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    map: BTreeMap<String, ParamValue>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.map.insert(name.into(), ParamValue::Value(value.into()));
    }

    pub fn bind(&mut self, name: impl Into<String>, cell: Rc<RefCell<Value>>) {
        self.map.insert(name.into(), ParamValue::Bound(cell));
    }

    /// Merge `other` in; its entries replace existing ones with the same name.
    pub fn merge(&mut self, other: Parameters) {
        self.map.extend(other.map);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.map.get(name).map(ParamValue::current)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Current values, ordered by name.
    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.map
            .iter()
            .map(|(k, v)| (k.clone(), v.current()))
            .collect()
    }

    /// Replace every parameter name in `sql` with its quoted value.
    ///
    /// Quoted string literals and quoted identifiers are copied verbatim.
    /// Elsewhere the longest matching name wins at each position, and
    /// replaced text is never scanned again.
    pub fn substitute(&self, sql: &str, dialect: &dyn Dialect) -> String {
        if self.map.is_empty() {
            return sql.to_string();
        }

        let mut names: Vec<(&str, String)> = self
            .map
            .iter()
            .filter(|(k, _)| !k.is_empty())
            .map(|(k, v)| (k.as_str(), dialect.quote_literal(&v.current())))
            .collect();
        names.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let ident_quote = dialect.identifier_quote();
        let backslash = dialect.backslash_escapes();

        let mut out = String::with_capacity(sql.len());
        let mut rest = sql;
        'scan: while let Some(ch) = rest.chars().next() {
            if ch == '\'' || ch == ident_quote {
                let len = quoted_span_len(rest, ch, backslash && ch == '\'');
                out.push_str(&rest[..len]);
                rest = &rest[len..];
                continue;
            }
            for (name, quoted) in &names {
                if let Some(tail) = rest.strip_prefix(*name) {
                    out.push_str(quoted);
                    rest = tail;
                    continue 'scan;
                }
            }
            out.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
        out
    }
}

/// Byte length of the quoted span at the start of `sql`, closing quote
/// included. An unterminated span runs to the end of the input.
fn quoted_span_len(sql: &str, quote: char, backslash_escapes: bool) -> usize {
    let mut escaped = false;
    for (i, ch) in sql.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if backslash_escapes && ch == '\\' {
            escaped = true;
        } else if ch == quote {
            return i + ch.len_utf8();
        }
    }
    sql.len()
}

impl<K, V> FromIterator<(K, V)> for Parameters
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}
