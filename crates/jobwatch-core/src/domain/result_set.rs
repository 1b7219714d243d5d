//! Row/column payloads of statement-style jobs, and their renderings.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::{Deserialize, Serialize};

/// Loosely typed query result: every cell is a string or null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, thiserror::Error)]
#[error("xml rendering failed: {0}")]
pub struct XmlError(String);

impl ResultSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with nulls; cells past the last
    /// column are dropped.
    pub fn with_row<I, S>(mut self, cells: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut row: Vec<Option<String>> = cells.into_iter().map(|c| c.map(Into::into)).collect();
        row.resize(self.columns.len(), None);
        self.rows.push(row);
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(column, cell)` pairs of a row, one per column. Missing cells are null.
    fn cells<'a>(&'a self, row: &'a [Option<String>]) -> impl Iterator<Item = (&'a str, Option<&'a str>)> + 'a {
        self.columns
            .iter()
            .enumerate()
            .map(move |(i, col)| (col.as_str(), row.get(i).and_then(|c| c.as_deref())))
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let obj = self
                    .cells(row)
                    .map(|(col, cell)| {
                        let v = match cell {
                            Some(s) => serde_json::Value::String(s.to_string()),
                            None => serde_json::Value::Null,
                        };
                        (col.to_string(), v)
                    })
                    .collect::<serde_json::Map<_, _>>();
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::Value::Array(rows)
    }

    /// `<results><row><col name="...">value</col>...</row>...</results>`
    ///
    /// Column names go in an attribute, so names such as `count(*)` stay
    /// well-formed. Null cells are written as `<col name="..." null="true"/>`.
    pub fn to_xml(&self) -> Result<String, XmlError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

        emit(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        emit(&mut writer, Event::Start(BytesStart::new("results")))?;
        for row in &self.rows {
            emit(&mut writer, Event::Start(BytesStart::new("row")))?;
            for (name, cell) in self.cells(row) {
                let mut col = BytesStart::new("col");
                col.push_attribute(("name", name));
                match cell {
                    Some(value) => {
                        emit(&mut writer, Event::Start(col))?;
                        emit(&mut writer, Event::Text(BytesText::new(value)))?;
                        emit(&mut writer, Event::End(BytesEnd::new("col")))?;
                    }
                    None => {
                        col.push_attribute(("null", "true"));
                        emit(&mut writer, Event::Empty(col))?;
                    }
                }
            }
            emit(&mut writer, Event::End(BytesEnd::new("row")))?;
        }
        emit(&mut writer, Event::End(BytesEnd::new("results")))?;

        String::from_utf8(writer.into_inner()).map_err(|e| XmlError(e.to_string()))
    }

    /// Plain text table, one tab-separated line per row, header first.
    pub fn to_text(&self) -> String {
        let mut out = self.columns.join("\t");
        for row in &self.rows {
            out.push('\n');
            let cells: Vec<&str> = self.cells(row).map(|(_, c)| c.unwrap_or("NULL")).collect();
            out.push_str(&cells.join("\t"));
        }
        out
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), XmlError> {
    writer.write_event(event).map_err(|e| XmlError(e.to_string()))
}
