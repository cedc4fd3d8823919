use std::{
    io::{Write, stdout},
    sync::Arc,
};

use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use tablekit::{ColumnDefinition, MemorySource, Record, SchemaField, Table, TableDef, TableOptions};

fn countries() -> MemorySource {
    let berlin = Record::object().set("name", "Berlin").set("population", 30);
    let amsterdam = Record::object().set("name", "Amsterdam").set("population", 6);

    MemorySource::new(vec![
        Record::mapping()
            .set("id", 1)
            .set("name", "Austria")
            .set("population", 8)
            .set("system", "republic")
            .set("capital", None::<Record>),
        Record::mapping()
            .set("id", 2)
            .set("name", "Germany")
            .set("population", 81)
            .set("capital", berlin),
        Record::mapping()
            .set("id", 3)
            .set("name", "France")
            .set("population", 64)
            .set("system", "republic")
            .set("capital", None::<Record>),
        Record::mapping()
            .set("id", 4)
            .set("name", "Netherlands")
            .set("population", 16)
            .set("system", "monarchy")
            .set("capital", amsterdam),
    ])
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(false)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let order_by = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "system,-population".to_string());

    let def = TableDef::new("countries")
        .schema(vec![
            SchemaField::new("id"),
            SchemaField::new("name"),
            SchemaField::new("population"),
            SchemaField::new("system").with_verbose_name("Political system"),
        ])
        .column(
            ColumnDefinition::new("capital")
                .accessor("capital.name")
                .default_value("n/a"),
        )
        .column(ColumnDefinition::new("system").default_value("unknown"))
        .options(TableOptions::default().order_by("id"));

    let mut table = Table::new(&def, Arc::new(countries()))?;
    table.set_order_by(order_by.as_str())?;

    let mut stdout = stdout().lock();
    let columns = table.columns();

    stdout
        .write_all(format!("ordered by: {}\n", table.order_by()).as_bytes())
        .into_diagnostic()?;
    for column in &columns {
        stdout
            .write_all(format!(" | {: <16}", column.verbose_name()).as_bytes())
            .into_diagnostic()?;
    }
    stdout.write_all(b"\n").into_diagnostic()?;

    for row in &table.rows()? {
        for column in &columns {
            let cell = match row.get(column.name()) {
                Ok(value) => value.to_string(),
                Err(err) => format!("<{err}>"),
            };
            stdout
                .write_all(format!(" | {: <16}", cell).as_bytes())
                .into_diagnostic()?;
        }
        stdout.write_all(b"\n").into_diagnostic()?;
    }

    stdout.flush().into_diagnostic()?;
    Ok(())
}
