// 🏢 Entity Builder - one canonical entity per rendered node
//
// Copies scalar attributes verbatim, links the deduplicated references,
// writes revenue/expense history, and records the raw → entity id mapping.

use crate::dataset::{FinancePoint, NodeId, RawNode, Scalar};
use crate::db::{insert_entity, insert_finance, link_reference, EntityId, FinanceKind, ReferenceKind};
use crate::identifiers::IdentifierMap;
use crate::references::ReferenceIndex;
use rusqlite::Connection;

/// Build the entity for `node` and register it in `ids`.
pub fn create_entity(
    conn: &Connection,
    node: &RawNode,
    references: &ReferenceIndex,
    ids: &mut IdentifierMap,
) -> rusqlite::Result<EntityId> {
    warn_if_text(node.id, "employees", node.employees.as_ref());
    warn_if_text(node.id, "followers", node.followers.as_ref());
    let entity_id = insert_entity(conn, node)?;

    attach_references(
        conn,
        entity_id,
        ReferenceKind::Category,
        node.categories.iter().map(String::as_str),
        references,
    )?;
    attach_references(
        conn,
        entity_id,
        ReferenceKind::KeyPerson,
        node.key_people.iter().map(|p| p.name.as_str()),
        references,
    )?;
    attach_references(
        conn,
        entity_id,
        ReferenceKind::Relation,
        node.relations.iter().map(|r| r.entity.as_str()),
        references,
    )?;

    insert_history(conn, node.id, FinanceKind::Revenue, entity_id, &node.revenue)?;
    insert_history(conn, node.id, FinanceKind::Expense, entity_id, &node.expenses)?;

    if let Some(previous) = ids.put(node.id, entity_id) {
        tracing::warn!(
            node = node.id,
            previous,
            entity_id,
            "duplicate node ID in dataset; later entity wins"
        );
    }

    tracing::debug!(node = node.id, entity_id, name = ?node.name, "created entity");
    Ok(entity_id)
}

/// Build every node in order. Returns the number of entities created.
pub fn create_entities(
    conn: &Connection,
    nodes: &[RawNode],
    references: &ReferenceIndex,
    ids: &mut IdentifierMap,
) -> rusqlite::Result<usize> {
    for node in nodes {
        create_entity(conn, node, references, ids)?;
    }

    tracing::info!(entities = nodes.len(), mapped = ids.len(), "built entities");
    Ok(nodes.len())
}

fn insert_history(
    conn: &Connection,
    node: NodeId,
    kind: FinanceKind,
    entity_id: EntityId,
    points: &[FinancePoint],
) -> rusqlite::Result<()> {
    for point in points {
        warn_if_text(node, kind.table(), point.amount.as_ref());
        warn_if_text(node, kind.table(), point.year.as_ref());
        insert_finance(conn, kind, entity_id, point)?;
    }
    Ok(())
}

/// Non-numeric values are stored verbatim; flag them so they can be cleaned upstream.
fn warn_if_text(node: NodeId, field: &str, value: Option<&Scalar>) {
    if let Some(text) = value.and_then(Scalar::as_text) {
        tracing::warn!(node, field, value = text, "non-numeric value stored verbatim");
    }
}

fn attach_references<'a>(
    conn: &Connection,
    entity_id: EntityId,
    kind: ReferenceKind,
    names: impl Iterator<Item = &'a str>,
    references: &ReferenceIndex,
) -> rusqlite::Result<()> {
    for name in names {
        match references.get(kind, name) {
            Some(reference_id) => link_reference(conn, kind, entity_id, reference_id)?,
            None => tracing::warn!(
                table = kind.table(),
                name,
                entity_id,
                "reference was never deduplicated; skipping"
            ),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{PersonRef, RelationRef};
    use crate::db::{entity_finances, entity_references, find_entity, setup_database, table_counts};
    use crate::references::create_references;

    fn store() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn node(id: i64, name: &str, categories: &[&str]) -> RawNode {
        RawNode {
            id,
            name: Some(name.to_string()),
            nickname: Some(format!("{} nick", name)),
            location: Some("Portland, OR".to_string()),
            entity_type: Some("For-Profit".to_string()),
            influence: Some("global".to_string()),
            employees: Some(Scalar::Int(40)),
            url: Some("https://example.org".to_string()),
            twitter_handle: Some("@example".to_string()),
            followers: Some(Scalar::Int(1000)),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            key_people: vec![],
            relations: vec![],
            revenue: vec![],
            expenses: vec![],
        }
    }

    #[test]
    fn test_scalar_attributes_copied() {
        let conn = store();
        let raw = node(1, "Code for America", &[]);
        let mut ids = IdentifierMap::new();

        let id = create_entity(&conn, &raw, &ReferenceIndex::default(), &mut ids).unwrap();
        let entity = find_entity(&conn, id).unwrap().unwrap();

        assert_eq!(entity.name, raw.name);
        assert_eq!(entity.nickname, raw.nickname);
        assert_eq!(entity.location, raw.location);
        assert_eq!(entity.entity_type, raw.entity_type);
        assert_eq!(entity.influence, raw.influence);
        assert_eq!(entity.employees, raw.employees);
        assert_eq!(entity.url, raw.url);
        assert_eq!(entity.twitter_handle, raw.twitter_handle);
        assert_eq!(entity.followers, raw.followers);
        assert_eq!(ids.get(1), Some(id));
    }

    #[test]
    fn test_shared_category_is_same_record() {
        let conn = store();
        let nodes = vec![node(1, "A", &["Health"]), node(2, "B", &["Health"])];
        let references = create_references(&conn, &nodes).unwrap();
        let mut ids = IdentifierMap::new();

        create_entities(&conn, &nodes, &references, &mut ids).unwrap();

        let a = entity_references(&conn, ReferenceKind::Category, ids.get(1).unwrap()).unwrap();
        let b = entity_references(&conn, ReferenceKind::Category, ids.get(2).unwrap()).unwrap();

        assert_eq!(a.len(), 1);
        assert_eq!(a, b);
        assert_eq!(table_counts(&conn).unwrap().categories, 1);
    }

    #[test]
    fn test_people_relations_and_finances() {
        let conn = store();
        let mut raw = node(5, "Sunlight", &["Transparency", "Data"]);
        raw.key_people = vec![
            PersonRef { name: "Ada".to_string() },
            PersonRef { name: "Grace".to_string() },
        ];
        raw.relations = vec![RelationRef { entity: "Knight Foundation".to_string() }];
        raw.revenue = vec![
            FinancePoint { amount: Some(Scalar::Real(1000.0)), year: Some(Scalar::Int(2012)) },
            FinancePoint { amount: Some(Scalar::Real(1500.5)), year: Some(Scalar::Int(2013)) },
        ];
        raw.expenses = vec![FinancePoint { amount: Some(Scalar::Real(900.0)), year: None }];

        let nodes = vec![raw];
        let references = create_references(&conn, &nodes).unwrap();
        let mut ids = IdentifierMap::new();
        let id = create_entity(&conn, &nodes[0], &references, &mut ids).unwrap();

        let categories = entity_references(&conn, ReferenceKind::Category, id).unwrap();
        let names: Vec<_> = categories.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["Transparency", "Data"]);

        assert_eq!(entity_references(&conn, ReferenceKind::KeyPerson, id).unwrap().len(), 2);
        assert_eq!(entity_references(&conn, ReferenceKind::Relation, id).unwrap().len(), 1);
        assert_eq!(entity_finances(&conn, FinanceKind::Revenue, id).unwrap(), nodes[0].revenue);
        assert_eq!(entity_finances(&conn, FinanceKind::Expense, id).unwrap(), nodes[0].expenses);
    }

    #[test]
    fn test_non_numeric_values_stored_verbatim() {
        let conn = store();
        let mut raw = node(6, "Loose Org", &[]);
        raw.employees = Some(Scalar::Text("10-50".to_string()));
        raw.followers = Some(Scalar::Real(12.7));
        raw.revenue = vec![FinancePoint {
            amount: Some(Scalar::Text("$5,000".to_string())),
            year: Some(Scalar::Int(2014)),
        }];
        let mut ids = IdentifierMap::new();

        let id = create_entity(&conn, &raw, &ReferenceIndex::default(), &mut ids).unwrap();
        let entity = find_entity(&conn, id).unwrap().unwrap();

        assert_eq!(entity.employees, raw.employees);
        assert_eq!(entity.followers, Some(Scalar::Real(12.7)));
        assert_eq!(entity_finances(&conn, FinanceKind::Revenue, id).unwrap(), raw.revenue);
    }

    #[test]
    fn test_unknown_reference_is_skipped() {
        let conn = store();
        let raw = node(1, "A", &["Never Deduplicated"]);
        let mut ids = IdentifierMap::new();

        let id = create_entity(&conn, &raw, &ReferenceIndex::default(), &mut ids).unwrap();

        assert!(entity_references(&conn, ReferenceKind::Category, id).unwrap().is_empty());
    }

    #[test]
    fn test_every_node_is_mapped() {
        let conn = store();
        let nodes = vec![node(3, "A", &[]), node(9, "B", &[]), node(4, "C", &[])];
        let mut ids = IdentifierMap::new();

        let created = create_entities(&conn, &nodes, &ReferenceIndex::default(), &mut ids).unwrap();

        assert_eq!(created, 3);
        assert_eq!(ids.len(), nodes.len());
        assert!(nodes.iter().all(|n| ids.contains(n.id)));
    }
}
