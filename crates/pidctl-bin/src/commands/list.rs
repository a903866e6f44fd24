// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Catalog listing.

use std::io::Write;

use pidctl_core::{Catalog, GroupMember};

use crate::cli::ListArgs;
use crate::error::BinResult;
use crate::output::{CatalogListing, CatalogRow, Printer};

/// Lists the catalog, or the registers of one group.
pub fn list<W: Write>(catalog: &Catalog, args: &ListArgs, printer: &mut Printer<W>) -> BinResult<()> {
    let registers: Vec<CatalogRow<'_>> = match args.group {
        Some(group) => {
            let members = group.members();
            members
                .iter()
                .filter_map(|member| match member {
                    GroupMember::Register(symbol) => catalog.get(symbol),
                    GroupMember::Flags => None,
                })
                .map(CatalogRow::from)
                .collect()
        }
        None => catalog.iter().map(CatalogRow::from).collect(),
    };

    printer.emit(&CatalogListing { registers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use pidctl_core::RegisterGroup;

    fn listing(group: Option<RegisterGroup>, format: OutputFormat) -> String {
        let mut printer = Printer::new(format, Vec::new());
        list(&Catalog::generate(), &ListArgs { group }, &mut printer).unwrap();
        String::from_utf8(printer.into_inner()).unwrap()
    }

    #[test]
    fn test_list_control_group() {
        let text = listing(Some(RegisterGroup::Control), OutputFormat::Text);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("SV"));
        assert_eq!(lines[4], "4 registers");
    }

    #[test]
    fn test_list_status_skips_flags() {
        let text = listing(Some(RegisterGroup::Status), OutputFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["registers"].as_array().unwrap().len(), 4);
        assert_eq!(json["registers"][3]["symbol"], "Pr+t");
        assert_eq!(json["registers"][3]["writable"], false);
    }

    #[test]
    fn test_list_everything() {
        let catalog = Catalog::generate();
        let text = listing(None, OutputFormat::Text);
        assert!(text.ends_with(&format!("{} registers\n", catalog.len())));
    }
}
