//! GHS Label CLI
//!
//! Commands: resolve, check-cas, filter, override, history, favorites,
//! templates, print
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation failure

use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ghslabel_core::{
    history::{ChemicalRef, Favorites, SearchHistory},
    config::ConfigOverrides,
    logging::{init_logging, LogFormat},
    model::RecordSet,
    resolver::candidates,
    results::{ResultQuery, SortKey},
    storage::StateDir,
    templates::TemplateLibrary,
    ChemicalRecord, ComposeRequest, CustomFields, FileHost, LabelCompositor, LabelConfig,
    LabelSize, LabelTemplate, NameDisplay, Orientation, OverrideStore, PrintSpooler, SignalWord,
    ToolConfig, Validator,
};

#[derive(Parser)]
#[command(name = "ghslabel-cli")]
#[command(about = "GHS Label CLI - chemical hazard classification and label printing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON config file
    #[arg(short, long, global = true, env = "GHSLABEL_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding favorites, history, overrides and saved templates
    #[arg(long, global = true, env = "GHSLABEL_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Staging directory for print surfaces
    #[arg(long, global = true, env = "GHSLABEL_SPOOL_DIR")]
    spool_dir: Option<PathBuf>,

    /// Inline pictograms from this directory instead of linking them
    #[arg(long, global = true, env = "GHSLABEL_PICTOGRAM_DIR")]
    pictogram_dir: Option<PathBuf>,

    /// Base URL for linked pictogram images
    #[arg(long, global = true, env = "GHSLABEL_PICTOGRAM_BASE_URL")]
    pictogram_base_url: Option<String>,

    /// Base URL of the compound lookup page encoded in QR codes
    #[arg(long, global = true, env = "GHSLABEL_LOOKUP_BASE_URL")]
    lookup_base_url: Option<String>,

    /// QR image service; the encoded link is appended
    #[arg(long, global = true, env = "GHSLABEL_QR_ENDPOINT")]
    qr_endpoint: Option<String>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true, env = "GHSLABEL_LOG")]
    log_level: Option<String>,

    /// pretty | json
    #[arg(long, global = true, env = "GHSLABEL_LOG_FORMAT", value_parser = parse_wire::<LogFormat>)]
    log_format: Option<LogFormat>,
}

impl Cli {
    fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            state_dir: self.state_dir.clone(),
            spool_dir: self.spool_dir.clone(),
            pictogram_dir: self.pictogram_dir.clone(),
            pictogram_base_url: self.pictogram_base_url.clone(),
            lookup_base_url: self.lookup_base_url.clone(),
            qr_endpoint: self.qr_endpoint.clone(),
            log_level: self.log_level.clone(),
            log_format: self.log_format,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve effective classifications for looked-up records
    Resolve {
        /// JSON file with search results
        #[arg(short, long)]
        records: PathBuf,

        /// Only this CAS number
        #[arg(long)]
        cas: Option<String>,

        /// Also list every candidate classification
        #[arg(long)]
        candidates: bool,
    },

    /// Validate batch CAS input
    CheckCas {
        /// Free text: CAS numbers separated by newlines, commas or spaces
        #[arg(short, long)]
        input: String,
    },

    /// Filter and sort search results
    Filter(FilterArgs),

    /// Manage custom classification choices
    Override {
        #[command(subcommand)]
        action: OverrideAction,
    },

    /// Search history
    History {
        #[command(subcommand)]
        action: ListAction,
    },

    /// Favorite chemicals
    Favorites {
        #[command(subcommand)]
        action: FavoriteAction,
    },

    /// Saved label templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Compose labels and print them to an HTML file
    Print(PrintArgs),
}

#[derive(Args)]
struct FilterArgs {
    #[arg(short, long)]
    records: PathBuf,
    /// Match CAS, English or Chinese name
    #[arg(long)]
    text: Option<String>,
    #[arg(long)]
    found: Option<bool>,
    #[arg(long, value_parser = parse_wire::<SignalWord>)]
    signal_word: Option<SignalWord>,
    #[arg(long)]
    pictogram: Option<String>,
    /// Only chemicals with alternate classifications
    #[arg(long)]
    multiple: bool,
    /// input | cas | name | hazard_count | severity
    #[arg(long, value_parser = parse_wire::<SortKey>, default_value = "input")]
    sort: SortKey,
    #[arg(long)]
    desc: bool,
}

#[derive(Subcommand)]
enum OverrideAction {
    Set {
        #[arg(long)]
        cas: String,
        /// 0 is the primary classification, 1.. the alternates
        #[arg(long)]
        index: usize,
        #[arg(long, default_value = "")]
        note: String,
    },
    Clear {
        #[arg(long)]
        cas: String,
    },
    List,
}

#[derive(Subcommand)]
enum ListAction {
    List,
    Remove {
        #[arg(long)]
        cas: String,
    },
    Clear,
}

#[derive(Subcommand)]
enum FavoriteAction {
    List,
    Add(ChemicalArgs),
    Remove {
        #[arg(long)]
        cas: String,
    },
    Toggle(ChemicalArgs),
    Clear,
}

#[derive(Args)]
struct ChemicalArgs {
    #[arg(long)]
    cas: String,
    #[arg(long)]
    name_en: Option<String>,
    #[arg(long)]
    name_zh: Option<String>,
}

#[derive(Subcommand)]
enum TemplateAction {
    List,
    Save {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        label: LabelArgs,
    },
    Delete {
        #[arg(long)]
        id: String,
    },
}

#[derive(Args)]
struct LabelArgs {
    /// small | medium | large
    #[arg(long, value_parser = parse_wire::<LabelSize>)]
    size: Option<LabelSize>,
    /// icon | standard | full | qrcode
    #[arg(long, value_parser = parse_wire::<LabelTemplate>)]
    template: Option<LabelTemplate>,
    /// portrait | landscape
    #[arg(long, value_parser = parse_wire::<Orientation>)]
    orientation: Option<Orientation>,
    /// both | en | zh
    #[arg(long, value_parser = parse_wire::<NameDisplay>)]
    name_display: Option<NameDisplay>,
    #[arg(long)]
    lab_name: Option<String>,
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    batch_number: Option<String>,
}

impl LabelArgs {
    fn apply(&self, config: &mut LabelConfig, fields: &mut CustomFields) {
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(template) = self.template {
            config.template = template;
        }
        if let Some(orientation) = self.orientation {
            config.orientation = orientation;
        }
        if let Some(name_display) = self.name_display {
            config.name_display = name_display;
        }
        if self.lab_name.is_some() {
            fields.lab_name = self.lab_name.clone();
        }
        if self.date.is_some() {
            fields.date = self.date.clone();
        }
        if self.batch_number.is_some() {
            fields.batch_number = self.batch_number.clone();
        }
    }
}

#[derive(Args)]
struct PrintArgs {
    #[arg(short, long)]
    records: PathBuf,
    /// CAS numbers to print, in order (default: every found record)
    #[arg(long, value_delimiter = ',')]
    cas: Vec<String>,
    /// Copies per chemical as CAS=N (1-20)
    #[arg(long = "qty", value_parser = parse_quantity)]
    quantities: Vec<(String, i64)>,
    /// Start from a saved template (id or name)
    #[arg(long)]
    saved: Option<String>,
    #[command(flatten)]
    label: LabelArgs,
    /// Output HTML file
    #[arg(short, long, default_value = "labels.html")]
    out: PathBuf,
}

/// Parse a CLI value using the serde wire name.
fn parse_wire<T: DeserializeOwned>(value: &str) -> Result<T, String> {
    serde_json::from_value(Value::String(value.to_string()))
        .or_else(|_| serde_json::from_value(Value::String(capitalize(value))))
        .map_err(|e| format!("invalid value '{value}': {e}"))
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.map(|c| c.to_ascii_lowercase())).collect(),
        None => String::new(),
    }
}

fn parse_quantity(value: &str) -> Result<(String, i64), String> {
    let (cas, qty) = value
        .split_once('=')
        .ok_or_else(|| format!("expected CAS=N, got '{value}'"))?;
    let qty = qty
        .trim()
        .parse()
        .map_err(|e| format!("invalid quantity in '{value}': {e}"))?;
    Ok((cas.trim().to_string(), qty))
}

type CommandResult = Result<(Value, ExitCode), String>;

fn ok(value: Value) -> CommandResult {
    Ok((value, ExitCode::SUCCESS))
}

fn emit(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("failed to encode output: {e}"),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match ToolConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            emit(&json!({"success": false, "error": e.to_string()}));
            return ExitCode::FAILURE;
        }
    };
    config.apply(cli.config_overrides());

    if let Err(e) = init_logging(&config.log_level, config.log_format) {
        eprintln!("{e}");
    }

    let state = match StateDir::open(&config.state_dir) {
        Ok(s) => s,
        Err(e) => {
            emit(&json!({"success": false, "error": e.to_string()}));
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Resolve { records, cas, candidates } => cmd_resolve(&state, &records, cas.as_deref(), candidates),
        Commands::CheckCas { input } => cmd_check_cas(&input),
        Commands::Filter(args) => cmd_filter(&state, &args),
        Commands::Override { action } => cmd_override(&state, action),
        Commands::History { action } => cmd_history(&state, action),
        Commands::Favorites { action } => cmd_favorites(&state, action),
        Commands::Templates { action } => cmd_templates(&state, action),
        Commands::Print(args) => cmd_print(&state, &config, &args),
    };

    match result {
        Ok((value, code)) => {
            emit(&value);
            code
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            emit(&json!({"success": false, "error": e}));
            ExitCode::FAILURE
        }
    }
}

fn load_records(path: &Path) -> Result<Vec<ChemicalRecord>, String> {
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let set: RecordSet = serde_json::from_str(&content).map_err(|e| format!("Invalid records file: {e}"))?;
    Ok(set.into_records())
}

fn cmd_resolve(state: &StateDir, path: &Path, cas: Option<&str>, with_candidates: bool) -> CommandResult {
    let records = load_records(path)?;
    let overrides = OverrideStore::open(state);
    let mut history = SearchHistory::open(state);

    let mut rows = vec![];
    for record in records.iter().filter(|r| cas.map_or(true, |c| r.cas_number.trim() == c.trim())) {
        let effective = ghslabel_core::resolve(Some(record), overrides.get(&record.cas_number));
        if record.found {
            history.record(ChemicalRef::from_record(record)).map_err(|e| e.to_string())?;
        }
        let mut row = json!({
            "cas_number": record.cas_number,
            "name_en": record.name_en,
            "name_zh": record.name_zh,
            "found": record.found,
            "has_multiple_classifications": record.has_multiple_classifications(),
            "effective": effective,
        });
        if with_candidates && record.found {
            row["candidates"] = json!(candidates(record));
        }
        rows.push(row);
    }

    ok(json!({"success": true, "results": rows}))
}

fn cmd_check_cas(input: &str) -> CommandResult {
    let parse = Validator::new().parse_batch(input);
    let code = if parse.has_errors() { ExitCode::from(2) } else { ExitCode::SUCCESS };
    Ok((json!(parse), code))
}

fn cmd_filter(state: &StateDir, args: &FilterArgs) -> CommandResult {
    let records = load_records(&args.records)?;
    let overrides = OverrideStore::open(state);
    let query = ResultQuery {
        text: args.text.clone(),
        found: args.found,
        signal_word: args.signal_word,
        pictogram: args.pictogram.clone(),
        multiple_only: args.multiple,
        sort: args.sort,
        descending: args.desc,
    };
    let rows = query.apply(&records, overrides.all());
    ok(json!({"success": true, "count": rows.len(), "results": rows}))
}

fn cmd_override(state: &StateDir, action: OverrideAction) -> CommandResult {
    let mut store = OverrideStore::open(state);
    match action {
        OverrideAction::Set { cas, index, note } => {
            let saved = store.set_override(&cas, index, &note).map_err(|e| e.to_string())?;
            ok(json!({"success": true, "cas_number": cas.trim(), "override": saved}))
        }
        OverrideAction::Clear { cas } => {
            let removed = store.clear_override(&cas).map_err(|e| e.to_string())?;
            ok(json!({"success": true, "removed": removed}))
        }
        OverrideAction::List => ok(json!(store.all())),
    }
}

fn cmd_history(state: &StateDir, action: ListAction) -> CommandResult {
    let mut history = SearchHistory::open(state);
    match action {
        ListAction::List => ok(json!(history.entries())),
        ListAction::Remove { cas } => {
            let removed = history.remove(&cas).map_err(|e| e.to_string())?;
            ok(json!({"success": true, "removed": removed}))
        }
        ListAction::Clear => {
            history.clear().map_err(|e| e.to_string())?;
            ok(json!({"success": true}))
        }
    }
}

fn chemical_ref(args: &ChemicalArgs) -> ChemicalRef {
    ChemicalRef {
        name_en: args.name_en.clone(),
        name_zh: args.name_zh.clone(),
        ..ChemicalRef::bare(&args.cas)
    }
}

fn cmd_favorites(state: &StateDir, action: FavoriteAction) -> CommandResult {
    let mut favorites = Favorites::open(state);
    match action {
        FavoriteAction::List => ok(json!(favorites.entries())),
        FavoriteAction::Add(args) => {
            favorites.add(chemical_ref(&args)).map_err(|e| e.to_string())?;
            ok(json!({"success": true, "favorite": true}))
        }
        FavoriteAction::Remove { cas } => {
            let removed = favorites.remove(&cas).map_err(|e| e.to_string())?;
            ok(json!({"success": true, "removed": removed}))
        }
        FavoriteAction::Toggle(args) => {
            let now = favorites.toggle(chemical_ref(&args)).map_err(|e| e.to_string())?;
            ok(json!({"success": true, "favorite": now}))
        }
        FavoriteAction::Clear => {
            favorites.clear().map_err(|e| e.to_string())?;
            ok(json!({"success": true}))
        }
    }
}

fn cmd_templates(state: &StateDir, action: TemplateAction) -> CommandResult {
    let mut library = TemplateLibrary::open(state);
    match action {
        TemplateAction::List => ok(json!(library.list())),
        TemplateAction::Save { name, label } => {
            let mut config = LabelConfig::default();
            let mut fields = CustomFields::default();
            label.apply(&mut config, &mut fields);
            match library.save(&name, config, fields) {
                Ok(saved) => ok(json!({"success": true, "template": saved})),
                Err(e) => Ok((json!({"success": false, "error": e.to_string()}), ExitCode::from(2))),
            }
        }
        TemplateAction::Delete { id } => {
            library.delete(&id).map_err(|e| e.to_string())?;
            ok(json!({"success": true}))
        }
    }
}

fn cmd_print(state: &StateDir, config: &ToolConfig, args: &PrintArgs) -> CommandResult {
    let records = load_records(&args.records)?;

    let selection: Vec<ChemicalRecord> = if args.cas.is_empty() {
        records.into_iter().filter(|r| r.found).collect()
    } else {
        let by_cas: HashMap<&str, &ChemicalRecord> =
            records.iter().map(|r| (r.cas_number.trim(), r)).collect();
        let mut selected = vec![];
        for cas in &args.cas {
            match by_cas.get(cas.trim()) {
                Some(record) => selected.push((*record).clone()),
                None => tracing::warn!(cas = %cas, "CAS number not in records file, skipping"),
            }
        }
        selected
    };

    let mut label_config = LabelConfig::default();
    let mut custom_fields = CustomFields::default();
    if let Some(key) = &args.saved {
        let library = TemplateLibrary::open(state);
        let saved = library
            .get(key)
            .ok_or_else(|| format!("Template not found: {key}"))?;
        label_config = saved.config;
        custom_fields = saved.custom_fields.clone();
    }
    args.label.apply(&mut label_config, &mut custom_fields);

    let request = ComposeRequest {
        selection,
        config: label_config,
        custom_fields,
        quantities: args.quantities.iter().cloned().collect(),
    };

    let overrides = OverrideStore::open(state);
    let compositor = LabelCompositor::new(config.catalog(), config.links());
    let document = compositor
        .compose(&request, overrides.all())
        .map_err(|e| e.to_string())?;

    let mut spooler = PrintSpooler::new(FileHost::new(&config.spool_dir, &args.out), config.timings());
    let receipt = spooler.submit(document.as_ref()).map_err(|e| e.to_string())?;

    match receipt {
        Some(receipt) => ok(json!({
            "success": true,
            "printed": true,
            "output": args.out,
            "receipt": receipt,
        })),
        None => ok(json!({"success": true, "printed": false})),
    }
}
