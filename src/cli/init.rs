use std::io::IsTerminal;
use std::path::PathBuf;

use crate::db::{get_kv, open_data_dir, set_kv};
use crate::error::Result;
use crate::ledger::CACHE_KEY;
use crate::settings::{load_settings, save_settings, shellexpand_path, Settings};

pub fn run(data_dir: Option<String>, no_sample: bool, company: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    let defaults = Settings::default();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    } else if settings.data_dir == defaults.data_dir && std::io::stdin().is_terminal() {
        // First run: offer to move the data directory
        println!("Data directory [{}]: ", settings.data_dir);
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let chosen = input.trim();
        if !chosen.is_empty() {
            settings.data_dir = shellexpand_path(chosen);
        }
    }
    if let Some(name) = company.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()) {
        settings.company_name = name;
    }

    save_settings(&settings)?;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(resolved.join("exports"))?;
    let conn = open_data_dir(&resolved)?;

    if no_sample && get_kv(&conn, CACHE_KEY)?.is_none() {
        set_kv(&conn, CACHE_KEY, "[]")?;
    }

    println!("Initialized cashbook at {}", resolved.display());
    println!("Company: {}", settings.company_name);
    Ok(())
}
