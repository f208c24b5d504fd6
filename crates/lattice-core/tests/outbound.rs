mod support;

use lattice_core::{CreateWireRepresentation, Entity, Translator};
use serde_json::json;
use support::{PROJECTS, Project, ProjectInput, registry};

#[test]
fn create_wire_representation_partial_input_expected_unset_fields_omitted() {
    let document = Project::create_wire_representation(&ProjectInput {
        name: Some("Apollo".to_string()),
        ..ProjectInput::default()
    })
    .expect("payload should build");

    assert_eq!(
        document.to_value().expect("payload should serialize"),
        json!({"data": {"type": "projects", "attributes": {"name": "Apollo"}}})
    );
}

#[test]
fn create_wire_representation_full_input_expected_linkage_shapes() {
    let document = Project::create_wire_representation(&ProjectInput {
        id: Some("p1".to_string()),
        name: Some("Apollo".to_string()),
        budget: Some(1200),
        owner_id: Some("u1".to_string()),
        member_ids: Some(vec!["u2".to_string(), "u3".to_string()]),
        lead: Some(("u2".to_string(), "Engineer".to_string())),
    })
    .expect("payload should build");

    assert_eq!(
        document.to_value().expect("payload should serialize"),
        json!({
            "data": {
                "type": "projects",
                "id": "p1",
                "attributes": {"name": "Apollo", "budget": 1200},
                "relationships": {
                    "lead": {
                        "data": {"type": "people", "id": "u2"},
                        "meta": {"role": "Engineer"}
                    },
                    "members": {
                        "data": [{"type": "people", "id": "u2"}, {"type": "people", "id": "u3"}]
                    },
                    "owner": {"data": {"type": "people", "id": "u1"}}
                }
            }
        })
    );
}

#[test]
fn create_wire_representation_served_back_expected_equivalent_entity() {
    let document = Project::create_wire_representation(&ProjectInput {
        id: Some("p1".to_string()),
        name: Some("Apollo".to_string()),
        owner_id: Some("u1".to_string()),
        lead: Some(("u2".to_string(), "Engineer".to_string())),
        ..ProjectInput::default()
    })
    .expect("payload should build");
    let mut served = document.to_value().expect("payload should serialize");
    served["included"] = json!([
        {"type": "people", "id": "u1", "attributes": {"name": "Ada"}},
        {"type": "people", "id": "u2", "attributes": {"name": "Grace"}}
    ]);

    let response = Translator::new(registry())
        .translate(&PROJECTS, served, None)
        .expect("translate should succeed");
    let project = response.one::<Project>().expect("one project");

    assert_eq!(project.id().expect("hydrated"), "p1");
    assert_eq!(project.name, "Apollo");
    assert_eq!(project.owner.as_ref().map(|owner| owner.name.as_str()), Some("Ada"));
    let lead = project.lead.as_ref().expect("lead should resolve");
    assert_eq!(lead.name, "Grace");
    assert_eq!(lead.role(), Some("Engineer"));
    assert!(project.members.is_none());
}
