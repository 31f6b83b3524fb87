/// A `(schema, table)` pair discovered by asking the engine's own
/// planner what a statement touches (§4.6). Qualified with the current
/// default schema by callers where the plan output leaves it implicit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TouchedRelation {
    pub schema: String,
    pub table: String,
}

impl TouchedRelation {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self { schema: schema.into(), table: table.into() }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

pub fn dedup(mut relations: Vec<TouchedRelation>) -> Vec<TouchedRelation> {
    relations.sort_by(|a, b| (&a.schema, &a.table).cmp(&(&b.schema, &b.table)));
    relations.dedup();
    relations
}
