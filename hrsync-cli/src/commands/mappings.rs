//! `hrsync mappings leaders|managers [--json]`

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use tabled::{settings::Style, Table, Tabled};

use hrsync_core::config::default_manager_job_levels;
use hrsync_core::{paths, PathType, RoleMapping};
use hrsync_store::Store;

use super::{home_dir, load_config};

#[derive(Subcommand, Debug)]
pub enum MappingsCommand {
    /// Department path → the department's person in charge.
    Leaders(MappingsArgs),
    /// Department path → active staff at a manager job level.
    Managers(MappingsArgs),
}

#[derive(Args, Debug)]
pub struct MappingsArgs {
    /// Emit the mappings in the role registry's JSON shape.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct MappingRow {
    #[tabled(rename = "path")]
    path: String,
    #[tabled(rename = "staff")]
    staff: String,
}

pub fn run(command: MappingsCommand) -> Result<()> {
    let home = home_dir()?;
    let config = load_config(&home)?;

    let db_path = paths::database_path(&home);
    if !db_path.exists() {
        bail!(
            "database not found at {}; run `hrsync init` first",
            db_path.display()
        );
    }
    let store = Store::open(&db_path)
        .with_context(|| format!("failed to open database '{}'", db_path.display()))?;

    let (mappings, json) = match command {
        MappingsCommand::Leaders(args) => {
            let path_type = config
                .roles
                .department_leaders
                .as_ref()
                .map(|r| r.path_type)
                .unwrap_or(PathType::Name);
            let mappings = store
                .organization_staff_mapping(path_type)
                .context("failed to derive leader mappings")?;
            (mappings, args.json)
        }
        MappingsCommand::Managers(args) => {
            let levels = config
                .roles
                .managers
                .as_ref()
                .map(|r| r.job_levels.clone())
                .unwrap_or_else(default_manager_job_levels);
            let mappings = store
                .manager_org_path(&levels)
                .context("failed to derive manager mappings")?;
            (mappings, args.json)
        }
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&mappings).context("failed to serialize mappings")?
        );
    } else {
        print_table(&mappings);
    }
    Ok(())
}

fn print_table(mappings: &[RoleMapping]) {
    if mappings.is_empty() {
        println!("No mappings derived. Run `hrsync run` to populate the database.");
        return;
    }
    let rows: Vec<MappingRow> = mappings
        .iter()
        .map(|m| MappingRow {
            path: m.path.join(" / "),
            staff: m.staffs.join(", "),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{} path(s)", mappings.len());
}
