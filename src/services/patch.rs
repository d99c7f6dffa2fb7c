use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    NullableText(Option<String>),
    Int(i64),
    Flag(bool),
}

/// Sparse `UPDATE` over one row: only fields that were supplied are written,
/// and `updated_at` is bumped whenever at least one field is.
#[derive(Debug)]
pub struct FieldPatch {
    table: &'static str,
    fields: Vec<(&'static str, FieldValue)>,
}

impl FieldPatch {
    pub fn new(table: &'static str) -> Self {
        Self {
            table,
            fields: Vec::new(),
        }
    }

    pub fn text(self, column: &'static str, value: Option<String>) -> Self {
        self.push(column, value.map(FieldValue::Text))
    }

    pub fn nullable_text(self, column: &'static str, value: Option<Option<String>>) -> Self {
        self.push(column, value.map(FieldValue::NullableText))
    }

    pub fn int(self, column: &'static str, value: Option<i64>) -> Self {
        self.push(column, value.map(FieldValue::Int))
    }

    pub fn flag(self, column: &'static str, value: Option<bool>) -> Self {
        self.push(column, value.map(FieldValue::Flag))
    }

    fn push(mut self, column: &'static str, value: Option<FieldValue>) -> Self {
        if let Some(value) = value {
            self.fields.push((column, value));
        }
        self
    }

    /// Runs the update and returns how many fields were written; zero means no
    /// statement was issued at all.
    pub async fn execute(self, conn: &mut SqliteConnection, id: i64) -> sqlx::Result<usize> {
        let count = self.fields.len();
        if count == 0 {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", self.table));
        {
            let mut assignments = builder.separated(", ");
            for (column, value) in self.fields {
                assignments.push(format!("{column} = "));
                match value {
                    FieldValue::Text(text) => assignments.push_bind_unseparated(text),
                    FieldValue::NullableText(text) => assignments.push_bind_unseparated(text),
                    FieldValue::Int(number) => assignments.push_bind_unseparated(number),
                    FieldValue::Flag(flag) => assignments.push_bind_unseparated(i64::from(flag)),
                };
            }
            assignments.push("updated_at = CURRENT_TIMESTAMP");
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);

        builder.build().execute(&mut *conn).await?;
        Ok(count)
    }
}
