use lotus_preflight::TouchedRelation;
use std::collections::HashSet;

/// Automatic cache tags (§4.8): one for the backend, one for the saved
/// query (if the caller supplied an id), and one per touched table so a
/// schema change can invalidate exactly the affected cache entries.
pub fn automatic_tags(backend: &str, query_id: Option<&str>, relations: &[TouchedRelation]) -> HashSet<String> {
    let mut tags = HashSet::new();
    tags.insert(format!("repo:{backend}"));
    if let Some(id) = query_id {
        tags.insert(format!("query:{id}"));
    }
    for relation in relations {
        tags.insert(format!("table:{}.{}", relation.schema, relation.table));
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_backend_and_table_tags() {
        let relations = vec![TouchedRelation::new("public", "users")];
        let tags = automatic_tags("main", None, &relations);
        assert!(tags.contains("repo:main"));
        assert!(tags.contains("table:public.users"));
    }

    #[test]
    fn includes_query_tag_when_id_present() {
        let tags = automatic_tags("main", Some("q1"), &[]);
        assert!(tags.contains("query:q1"));
    }
}
