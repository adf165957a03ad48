//! Link command handler.

use contact_linker::services::RecordService;

/// Link command.
pub fn cmd_link(service: &RecordService, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let outcome = service.link_all()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("Link complete");
    println!("  Groups created: {}", outcome.groups_created);
    println!("  Linked to existing groups: {}", outcome.linked_to_existing);
    println!("  Linked to new groups: {}", outcome.linked_to_new);
    println!("  Skipped (no key): {}", outcome.skipped_without_key);
    println!("  Skipped (already linked): {}", outcome.skipped_already_linked);
    if !outcome.people_written {
        println!("  Nothing to write");
    }
    Ok(())
}
