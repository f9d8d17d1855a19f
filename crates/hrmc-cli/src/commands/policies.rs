use crate::error::Result;
use hrmc::core::policies::registry::PolicyRegistry;
use std::fmt::Write;

/// Lists the policy names a run file may refer to.
pub fn run() -> Result<()> {
    let registry = PolicyRegistry::with_builtins();
    print!("{}", render(&registry));
    Ok(())
}

fn render(registry: &PolicyRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Move generators ([[moves]]):");
    for name in registry.move_names() {
        let _ = writeln!(out, "  {}", name);
    }
    let _ = writeln!(out, "Validators ([[validators]]):");
    for name in registry.validator_names() {
        let _ = writeln!(out, "  {}", name);
    }
    out
}
