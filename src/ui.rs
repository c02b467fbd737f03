// UI layer: the interactive menu, built on `dialoguer` like the rest of the
// terminal flows. Every action catches its own errors so a failed request
// prints a message and the menu keeps running.

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};

use crate::api::RestClient;
use crate::model::{CatalogItem, InventoryReport};
use crate::suggest::{CatalogService, SuggestionCriteria, SuggestionRecorder};

const MENU: [&str; 5] = [
    "View bike suggestions (by CC, budget, location)",
    "Add/Update bike (store manager)",
    "View electric bikes (by budget, brand)",
    "Inventory report",
    "Exit",
];

/// Main interactive menu. Runs until the user picks "Exit".
pub fn main_menu(client: RestClient) -> Result<()> {
    let catalog = CatalogService::new(&client);
    let recorder = SuggestionRecorder::new(&client);

    loop {
        println!("\n{}", "RevPick - Bike Suggestion System".bold());
        let selection = Select::new().items(&MENU).default(0).interact()?;
        let outcome = match selection {
            0 => view_bike_suggestions(&recorder),
            1 => add_update_bike(&catalog),
            2 => view_electric_bikes(&recorder),
            3 => view_report(&recorder),
            _ => {
                println!("Goodbye!");
                break;
            }
        };
        if let Err(e) = outcome {
            println!("{}", format!("Error: {e}").red());
        }
    }
    Ok(())
}

fn view_bike_suggestions(recorder: &SuggestionRecorder) -> crate::Result<()> {
    let criteria = SuggestionCriteria {
        min_price: prompt_parsed("Min Budget [blank=any]", None),
        max_price: prompt_parsed("Max Budget [blank=any]", None),
        min_engine_cc: prompt_parsed("Min Engine CC [blank=any]", None),
        max_engine_cc: prompt_parsed("Max Engine CC [blank=any]", None),
        brand: prompt_text("Preferred Brand [blank=any]", None),
        location: prompt_text("Location/City [blank=any]", None),
        is_electric: Some(false),
        ..Default::default()
    };
    let customer = prompt_text("Customer ID to log suggestions for [blank=none]", None);

    let bikes = with_spinner("Searching catalog...", || {
        recorder.suggest_bikes(&criteria, customer.as_deref())
    })?;
    if bikes.is_empty() {
        println!("No bikes matched your preferences.");
        return Ok(());
    }
    println!("\nSuggestions:");
    print!("{}", bikes_table(&bikes, false));
    Ok(())
}

fn view_electric_bikes(recorder: &SuggestionRecorder) -> crate::Result<()> {
    let criteria = SuggestionCriteria {
        min_price: prompt_parsed("Min Budget [blank=any]", None),
        max_price: prompt_parsed("Max Budget [blank=any]", None),
        brand: prompt_text("Preferred Brand [blank=any]", None),
        is_electric: Some(true),
        ..Default::default()
    };
    let customer = prompt_text("Customer ID to log suggestions for [blank=none]", None);

    let bikes = with_spinner("Searching catalog...", || {
        recorder.suggest_bikes(&criteria, customer.as_deref())
    })?;
    if bikes.is_empty() {
        println!("No electric bikes matched your preferences.");
        return Ok(());
    }
    println!("\nElectric Bikes:");
    print!("{}", bikes_table(&bikes, true));
    Ok(())
}

fn add_update_bike(catalog: &CatalogService) -> crate::Result<()> {
    let prod_id = prompt_text("Existing Product ID to update [leave blank to create]", None);
    let name = prompt_text("Name", None).unwrap_or_default();
    let is_electric = Confirm::new()
        .with_prompt("Electric?")
        .default(false)
        .interact()
        .unwrap_or(false);
    let (engine_cc, power_kw) = if is_electric {
        (None, prompt_parsed("Power (kW)", None))
    } else {
        (prompt_parsed("Engine CC", None), None)
    };
    let price = prompt_parsed("Price", None);
    let stock = prompt_parsed("Stock", Some(0)).unwrap_or(0);
    let brand = prompt_text("Brand", None).unwrap_or_default();
    let category_id = prompt_text("Category ID (UUID) [blank=none]", None)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let item = CatalogItem {
        prod_id: prod_id.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
        name,
        brand,
        price,
        stock,
        category_id,
        engine_cc,
        power_kw,
        is_electric,
        ..Default::default()
    };

    let saved = with_spinner("Saving...", || catalog.add_or_update_bike(&item))?;
    let Some(saved) = saved else {
        println!("No changes made.");
        return Ok(());
    };
    println!("Saved:");
    println!("- prod_id: {}", or_dash(&saved.prod_id));
    println!("- name: {}", saved.name);
    if saved.is_electric {
        println!("- power_kw: {}", or_dash(&saved.power_kw));
    } else {
        println!("- engine_cc: {}", or_dash(&saved.engine_cc));
    }
    println!("- price: {}", or_dash(&saved.price));
    println!("- stock: {}", saved.stock);
    println!("- brand: {}", saved.brand);
    println!("- category_id: {}", or_dash(&saved.category_id));
    Ok(())
}

fn view_report(recorder: &SuggestionRecorder) -> crate::Result<()> {
    let report = with_spinner("Counting...", || recorder.generate_report())?;
    print!("{}", report_table(&report));
    Ok(())
}

/// Show a spinner while `op` runs.
fn with_spinner<T>(message: &str, op: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = op();
    spinner.finish_and_clear();
    out
}

/// Free-text prompt. Blank input or an interrupted prompt yields `default`.
pub fn prompt_text(message: &str, default: Option<&str>) -> Option<String> {
    let raw: String = Input::new()
        .with_prompt(message)
        .allow_empty(true)
        .interact_text()
        .unwrap_or_default();
    if raw.trim().is_empty() {
        default.map(str::to_string)
    } else {
        Some(raw)
    }
}

/// Numeric prompt with the same fallbacks as [`prompt_text`]; unparseable
/// input also yields `default`.
pub fn prompt_parsed<T: FromStr>(message: &str, default: Option<T>) -> Option<T> {
    let raw: String = Input::new()
        .with_prompt(message)
        .allow_empty(true)
        .interact_text()
        .unwrap_or_default();
    parse_or_default(&raw, default)
}

pub fn parse_or_default<T: FromStr>(raw: &str, default: Option<T>) -> Option<T> {
    match raw.trim() {
        "" => default,
        text => text.parse().ok().or(default),
    }
}

fn or_dash<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

/// Numbered table of bikes. Electric listings show motor power instead of
/// displacement, BHP and torque.
pub fn bikes_table(bikes: &[CatalogItem], electric: bool) -> String {
    let headers: &[&str] = if electric {
        &["#", "Name", "Brand", "Power(kW)", "Mileage", "Price(₹)", "Stock"]
    } else {
        &["#", "Name", "Brand", "CC", "BHP", "Torque(Nm)", "Mileage", "Price(₹)", "Stock"]
    };
    let rows: Vec<Vec<String>> = bikes
        .iter()
        .enumerate()
        .map(|(idx, b)| {
            let mut row = vec![(idx + 1).to_string(), b.name.clone(), b.brand.clone()];
            if electric {
                row.push(or_dash(&b.power_kw));
            } else {
                row.push(or_dash(&b.engine_cc));
                row.push(or_dash(&b.bhp));
                row.push(or_dash(&b.torque_nm));
            }
            row.push(or_dash(&b.mileage_kmpl));
            row.push(or_dash(&b.price));
            row.push(b.stock.to_string());
            row
        })
        .collect();
    render_table(headers, &rows)
}

pub fn report_table(report: &InventoryReport) -> String {
    let rows = vec![
        vec!["products".to_string(), report.products.to_string()],
        vec!["customers".to_string(), report.customers.to_string()],
        vec!["suggestions".to_string(), report.suggestions.to_string()],
    ];
    render_table(&["Table", "Rows"], &rows)
}

/// Left-aligned columns separated by two spaces, with a dashed rule under
/// the header.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let mut out = String::new();
    out.push_str(&table_line(headers.iter().copied(), &widths));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');
    for row in rows {
        out.push_str(&table_line(row.iter().map(String::as_str), &widths));
        out.push('\n');
    }
    out
}

fn table_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &w)| format!("{cell:<w$}"))
        .collect();
    padded.join("  ").trim_end().to_string()
}
