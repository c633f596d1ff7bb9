//! Flow listing command handler.

use taleweaver::FlowRegistry;

/// Print registered flow names, one per line.
pub fn list_flows(registry: &FlowRegistry) {
    let mut names = registry.list();
    names.sort();
    for name in names {
        println!("{}", name);
    }
}
