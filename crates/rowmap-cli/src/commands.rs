use std::fs::File;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, info_span};

use rowmap_ingest::{CsvCursor, CsvOptions};
use rowmap_map::{Materializer, RulesFile, compile_or_fetch};
use rowmap_model::RowRecord;

use crate::cli::{InputArgs, InspectArgs, MapArgs};
use crate::types::{InspectResult, MapResult, PropertyBinding};

pub fn run_inspect(args: &InspectArgs) -> Result<InspectResult> {
    let span = info_span!("inspect", input = %args.input.input.display());
    let _guard = span.enter();

    let rules_file = load_rules(&args.input)?;
    let rules = rules_file.rule_set(false).context("build mapping rules")?;
    let command = rules_file.command_id();
    let projector = compile_or_fetch(&rules, &command).context("compile projector")?;
    let cursor = open_csv(&args.input)?;

    let bindings: Vec<PropertyBinding> = rules
        .rules()
        .iter()
        .map(|rule| PropertyBinding {
            property: rule.property_name().to_string(),
            alias: rule.active_alias().to_string(),
            kind: rule.property().kind(),
            ordinal: cursor.get_ordinal(rule.active_alias()),
            processors: rule
                .processors()
                .iter()
                .map(|p| p.key().to_string())
                .collect(),
        })
        .collect();
    let absent = bindings.iter().filter(|b| b.ordinal.is_none()).count();
    info!(
        target_type = %projector.target_type(),
        properties = bindings.len(),
        absent,
        "inspected bindings"
    );

    Ok(InspectResult {
        target: projector.target_type().to_string(),
        command: command.to_string(),
        fingerprint: projector.fingerprint().to_hex(),
        columns: cursor.shape().columns().to_vec(),
        bindings,
    })
}

pub fn run_map(args: &MapArgs) -> Result<MapResult> {
    let span = info_span!("map", input = %args.input.input.display());
    let _guard = span.enter();

    let rules_file = load_rules(&args.input)?;
    let rules = rules_file
        .rule_set(args.strict)
        .context("build mapping rules")?;
    let projector =
        compile_or_fetch(&rules, &rules_file.command_id()).context("compile projector")?;
    let cursor = open_csv(&args.input)?;

    let started = Instant::now();
    let records = Materializer::new(&projector)
        .map(cursor)
        .with_context(|| format!("map rows of {}", args.input.input.display()))?;
    info!(
        target_type = %projector.target_type(),
        records = records.len(),
        elapsed_ms = started.elapsed().as_millis(),
        "mapped rows"
    );

    Ok(MapResult {
        target: projector.target_type().to_string(),
        fingerprint: projector.fingerprint().to_hex(),
        properties: rules
            .rules()
            .iter()
            .map(|rule| rule.property_name().to_string())
            .collect(),
        records,
    })
}

fn load_rules(input: &InputArgs) -> Result<RulesFile> {
    let rules = RulesFile::load(&input.rules)
        .with_context(|| format!("load rules file {}", input.rules.display()))?;
    debug!(
        target_type = %rules.target,
        strict_columns = rules.strict_columns,
        "rules file ready"
    );
    Ok(rules)
}

fn open_csv(input: &InputArgs) -> Result<CsvCursor<File>> {
    CsvCursor::from_path(&input.input, csv_options(input)?)
        .with_context(|| format!("open csv {}", input.input.display()))
}

fn csv_options(input: &InputArgs) -> Result<CsvOptions> {
    let Ok(delimiter) = u8::try_from(input.delimiter) else {
        bail!("delimiter must be a single ASCII character");
    };
    if !delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character");
    }
    Ok(CsvOptions::default()
        .with_delimiter(delimiter)
        .with_trim(!input.no_trim)
        .with_empty_as_null(!input.keep_empty))
}
