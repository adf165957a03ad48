//! Record command handlers.

use std::path::Path;

use serde::Deserialize;

use contact_linker::services::RecordService;
use contact_linker::{GroupId, Person, PersonId};

/// One entry of an import file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ImportRecord {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    group_key: Option<String>,
}

impl From<ImportRecord> for Person {
    fn from(record: ImportRecord) -> Self {
        Self {
            first_name: record.first_name,
            group_key: record.group_key,
            ..Self::default()
        }
    }
}

/// Import command.
pub fn cmd_import(service: &RecordService, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(file)
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;
    let records: Vec<ImportRecord> = serde_json::from_str(&contents)
        .map_err(|e| format!("failed to parse {}: {e}", file.display()))?;

    let people = service.add_people(records.into_iter().map(Person::from).collect())?;
    println!("Imported {} people", people.len());
    Ok(())
}

/// Groups command.
pub fn cmd_groups(service: &RecordService, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let groups = service.list_groups()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        println!("No groups");
        return Ok(());
    }
    for group in groups {
        let id = group.id.as_ref().map_or("-", GroupId::as_str);
        println!("{id}  {}", display_key(Some(&group.name)));
    }
    Ok(())
}

/// People command.
pub fn cmd_people(service: &RecordService, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let people = service.list_people()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&people)?);
        return Ok(());
    }

    if people.is_empty() {
        println!("No people");
        return Ok(());
    }
    for person in people {
        let id = person.id.as_ref().map_or("-", PersonId::as_str);
        let group = person.group_ref.as_ref().map_or("(unlinked)", GroupId::as_str);
        println!(
            "{id}  {:<20} {:<20} {group}",
            person.first_name.as_deref().unwrap_or(""),
            display_key(person.group_key.as_deref()),
        );
    }
    Ok(())
}

/// Add-group command.
pub fn cmd_add_group(
    service: &RecordService,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let group = service.create_group(name)?;
    println!(
        "Group created: {}",
        group.id.as_ref().map_or("-", GroupId::as_str)
    );
    Ok(())
}

/// Add-person command.
pub fn cmd_add_person(
    service: &RecordService,
    first_name: Option<&str>,
    key: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let person = service.add_person(first_name, key)?;
    println!(
        "Person created: {}",
        person.id.as_ref().map_or("-", PersonId::as_str)
    );
    Ok(())
}

/// Set-key command.
pub fn cmd_set_key(
    service: &RecordService,
    id: &str,
    key: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let person = service.set_group_key(&PersonId::new(id), key)?;
    println!(
        "Person {id} key set to {}",
        display_key(person.group_key.as_deref())
    );
    Ok(())
}

/// Delete-people command.
pub fn cmd_delete_people(
    service: &RecordService,
    ids: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let ids: Vec<PersonId> = ids.iter().map(PersonId::new).collect();
    let deleted = service.delete_people(&ids)?;
    println!("Deleted {deleted} of {} people", ids.len());
    Ok(())
}

/// Delete-group command.
pub fn cmd_delete_group(
    service: &RecordService,
    id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if service.delete_group(&GroupId::new(id))? {
        println!("Group {id} deleted");
    } else {
        println!("Group {id} not found");
    }
    Ok(())
}

/// Renders a key so that a missing key and an empty key stay distinguishable.
fn display_key(key: Option<&str>) -> String {
    match key {
        None => "(none)".to_string(),
        Some("") => "\"\"".to_string(),
        Some(k) => k.to_string(),
    }
}
