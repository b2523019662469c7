use anyhow::Result;
use log::debug;
use std::collections::BTreeSet;

use crate::{runtime::Runtime, settings::Settings};

/// List registered productions
#[tracing::instrument(skip(runtime, settings))]
pub fn list<R: Runtime>(runtime: &R, settings: &Settings) -> Result<()> {
    let productions = settings.productions(runtime)?;
    debug!("Found {} production(s)", productions.len());
    print!("{}", render_productions(&productions));
    Ok(())
}

pub(crate) fn render_productions(productions: &BTreeSet<String>) -> String {
    if productions.is_empty() {
        return "No productions found.\n".to_string();
    }

    let mut out = String::from("Available productions:\n");
    for name in productions {
        out.push_str(&format!("* {}\n", name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MemoryRuntime, test_settings};

    #[test]
    fn test_render_empty() {
        assert_eq!(render_productions(&BTreeSet::new()), "No productions found.\n");
    }

    #[test]
    fn test_render_sorted() {
        let names: BTreeSet<String> = ["dlt", "abc"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            render_productions(&names),
            "Available productions:\n* abc\n* dlt\n"
        );
    }

    #[test]
    fn test_list_without_productions_root() {
        let runtime = MemoryRuntime::default();
        assert!(list(&runtime, &test_settings()).is_ok());
    }
}
