//! INSERT / UPDATE / DELETE construction.

use super::{InsertPayload, QueryBuilder, StatementKind};
use crate::error::QueryError;
use crate::value::{Param, Value};

impl QueryBuilder {
    /// Queue one row for insertion as `(column, value)` pairs.
    ///
    /// The first row fixes the column list. Later rows are matched to it by
    /// name; a missing column is bound as NULL and an unknown one is an error.
    pub fn insert<I, K, V>(&mut self, row: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Param>,
    {
        self.kind = StatementKind::Insert;
        let pairs: Vec<(String, Param)> = row
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let payload = self.insert.get_or_insert_with(InsertPayload::default);
        if payload.columns.is_empty() {
            let (columns, values): (Vec<String>, Vec<Param>) = pairs.into_iter().unzip();
            payload.columns = columns;
            payload.rows.push(values);
            return self;
        }

        if let Some((unknown, _)) = pairs
            .iter()
            .find(|(k, _)| !payload.columns.iter().any(|c| c == k))
        {
            let err = QueryError::compile(format!(
                "insert row has column {unknown:?} that is not in the column list"
            ));
            self.fail(err);
            return self;
        }

        let mut pairs = pairs;
        let row = payload
            .columns
            .iter()
            .map(|column| match pairs.iter().position(|(k, _)| k == column) {
                Some(idx) => pairs.swap_remove(idx).1,
                None => Param::Value(Value::Null),
            })
            .collect();
        payload.rows.push(row);
        self
    }

    /// Set the insert column list explicitly; pair with [`values`](Self::values).
    pub fn insert_columns<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.kind = StatementKind::Insert;
        let payload = self.insert.get_or_insert_with(InsertPayload::default);
        payload.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Queue one positional row matching [`insert_columns`](Self::insert_columns).
    pub fn values<I, V>(&mut self, row: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Param>,
    {
        self.kind = StatementKind::Insert;
        self.insert
            .get_or_insert_with(InsertPayload::default)
            .rows
            .push(row.into_iter().map(Into::into).collect());
        self
    }

    /// Insert one row and report its generated key.
    ///
    /// `sequence` names the key column (`"id"` when `None`); Postgres returns
    /// it with `returning`, other dialects rely on the driver's last insert id.
    pub fn insert_get_id<I, K, V>(&mut self, row: I, sequence: Option<&str>) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Param>,
    {
        self.insert(row);
        self.sequence = Some(sequence.unwrap_or("id").to_string());
        self
    }

    /// Turn the builder into an UPDATE setting `values`, in the given order.
    pub fn update<I, K, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Param>,
    {
        self.kind = StatementKind::Update;
        self.updates = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Turn the builder into a DELETE.
    pub fn delete(&mut self) -> &mut Self {
        self.kind = StatementKind::Delete;
        self
    }
}
