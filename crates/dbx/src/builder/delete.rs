use super::select::{BuiltQuery, QueryBuilder};

impl QueryBuilder {
    /// `DELETE FROM t [WHERE ...]`
    pub fn build_delete(&self) -> BuiltQuery {
        let Some(table) = self.tables.first() else {
            return BuiltQuery::default();
        };
        let mut sql = format!("DELETE FROM {}", table.to_sql());
        self.push_where(&mut sql);
        BuiltQuery {
            sql,
            params: self.where_builder.params().to_vec(),
        }
    }
}
