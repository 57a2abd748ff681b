use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::{Instant, SystemTime};

use act_core::{Identifier, Namespace};
use act_registry::{
    ActConfig, CollisionPolicy, CommunityIndex, DirectoryProvider, InstallOutcome, Installer,
    Layout, RegistryLock, ScriptEntry, ShimLauncher, SyncOutcome, build_index,
    create_local_script, days, delete_script, find_script, list_scripts, prune_quarantine,
    synchronize_shims, update_readme,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "act")]
#[command(about = "Manage and run single-file Python scripts", version)]
struct Cli {
    /// Directory holding scripts, quarantine and shims [default: ~/.act].
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Configuration file [default: <root>/config.yml].
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Recreate shims for every installed script.
    Link,
    /// Create a local script from a template and open it in your editor.
    Create(CreateArgs),
    /// Open an existing script in your editor.
    Edit(IdentArgs),
    /// Run a script, passing along any extra arguments.
    Run(RunArgs),
    /// Delete a script and remove its shim.
    Delete(IdentArgs),
    /// List available scripts, grouped by namespace.
    List,
    /// Show the header metadata of a script.
    Meta(MetaArgs),
    /// Install a script from the community repository.
    Install(InstallArgs),
    /// Remove stale downloads from quarantine.
    Prune(PruneArgs),
    /// Build the index of a community script directory.
    Index(IndexArgs),
}

#[derive(Debug, Args)]
struct CreateArgs {
    /// Command name of the new script (prompted for if omitted).
    name: Option<String>,
}

#[derive(Debug, Args)]
struct IdentArgs {
    /// Command or alias, optionally prefixed with a namespace (e.g. community:weather).
    identifier: String,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Suppress the completion message.
    #[arg(short, long)]
    quiet: bool,
    /// Command or alias to run; pick from a list if omitted.
    identifier: Option<String>,
    /// Arguments passed to the script.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[derive(Debug, Args)]
struct MetaArgs {
    /// Command or alias, optionally namespaced.
    identifier: String,
    /// Print the metadata as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct InstallArgs {
    /// Name of the community script.
    name: String,
    /// Replace an installed script with the same name.
    #[arg(long)]
    force: bool,
    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    yes: bool,
    /// Directory to install from instead of the configured provider.
    #[arg(long, value_name = "DIR")]
    from: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct PruneArgs {
    /// Age limit in days [default: quarantine.max_age_days].
    #[arg(long, value_name = "DAYS")]
    older_than_days: Option<u64>,
}

#[derive(Debug, Args)]
struct IndexArgs {
    /// Directory of community scripts.
    dir: PathBuf,
    /// Where to write the JSON index [default: <DIR>/index].
    #[arg(long)]
    output: Option<PathBuf>,
    /// README whose script table should be refreshed.
    #[arg(long)]
    readme: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Index(args) => run_index(args),
        command => {
            Context::load(cli.root, cli.config).and_then(|ctx| run_command(&ctx, command))
        }
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run_command(ctx: &Context, command: Command) -> Result<(), String> {
    match command {
        Command::Link => run_link(ctx),
        Command::Create(args) => run_create(ctx, args),
        Command::Edit(args) => run_edit(ctx, args),
        Command::Run(args) => run_run(ctx, args),
        Command::Delete(args) => run_delete(ctx, args),
        Command::List => run_list(ctx),
        Command::Meta(args) => run_meta(ctx, args),
        Command::Install(args) => run_install(ctx, args),
        Command::Prune(args) => run_prune(ctx, args),
        Command::Index(args) => run_index(args),
    }
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Resolved root, configuration and shim launcher for one invocation.
struct Context {
    layout: Layout,
    config: ActConfig,
    launcher: ShimLauncher,
}

impl Context {
    fn load(root: Option<PathBuf>, config: Option<PathBuf>) -> Result<Self, String> {
        let root = absolute(root.unwrap_or_else(Layout::default_root))?;
        let config_path = config.map(absolute).transpose()?;

        let config = match &config_path {
            Some(path) => ActConfig::load(path),
            None => ActConfig::load_or_default(Layout::new(&root).config_path()),
        }
        .map_err(|e| e.to_string())?;

        let layout = Layout::from_config(&root, &config);
        layout.ensure_dirs().map_err(|e| e.to_string())?;

        // Shims re-enter this binary with the same root and config.
        let program = std::env::current_exe()
            .map_err(|err| format!("Failed to locate the act executable: {err}"))?;
        let mut launcher =
            ShimLauncher::new(program).with_args(["--root".to_string(), root.display().to_string()]);
        if let Some(path) = &config_path {
            launcher = launcher.with_args(["--config".to_string(), path.display().to_string()]);
        }
        debug!(root = %root.display(), bin_dir = %layout.bin_dir().display(), "loaded context");

        Ok(Self {
            layout,
            config,
            launcher,
        })
    }

    fn find(&self, identifier: &str) -> Result<ScriptEntry, String> {
        find_script(&self.layout.source(), &Identifier::parse(identifier)).map_err(|e| e.to_string())
    }

    fn sync(&self) -> Result<SyncOutcome, String> {
        synchronize_shims(&self.layout.source(), self.layout.bin_dir(), &self.launcher)
            .map_err(|e| e.to_string())
    }

    fn lock(&self) -> Result<RegistryLock, String> {
        RegistryLock::acquire(&self.layout).map_err(|e| e.to_string())
    }
}

fn absolute(path: PathBuf) -> Result<PathBuf, String> {
    std::path::absolute(&path).map_err(|err| format!("Invalid path '{}': {err}", path.display()))
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn run_link(ctx: &Context) -> Result<(), String> {
    let outcome = {
        let _lock = ctx.lock()?;
        ctx.sync()?
    };
    report_sync(&outcome, ctx.layout.bin_dir());

    let bin_dir = ctx.layout.bin_dir();
    if !dir_on_path(bin_dir) {
        eprintln!("warning: {} is not in your PATH.", bin_dir.display());
        println!("Add the following line to your shell configuration to use the shims:");
        println!("  export PATH=\"{}:$PATH\"", bin_dir.display());
    }
    Ok(())
}

fn run_create(ctx: &Context, args: CreateArgs) -> Result<(), String> {
    let name = match args.name {
        Some(name) => name,
        None => prompt_line("Enter script command name: ")?,
    };
    let path = create_local_script(
        &ctx.layout,
        &name,
        ctx.config.author.as_deref(),
        ctx.config.install.sanitize,
    )
    .map_err(|e| e.to_string())?;
    println!("Local script '{name}' created at {}", path.display());
    open_editor(&ctx.config, &path)
}

fn run_edit(ctx: &Context, args: IdentArgs) -> Result<(), String> {
    let entry = ctx.find(&args.identifier)?;
    open_editor(&ctx.config, &entry.path)
}

fn run_run(ctx: &Context, args: RunArgs) -> Result<(), String> {
    let entry = match &args.identifier {
        Some(identifier) => ctx.find(identifier)?,
        None => pick_script(ctx)?,
    };

    let started = Instant::now();
    let status = run_script(&ctx.config.runner, &entry.path, &args.args)?;
    let elapsed = started.elapsed();

    let code = exit_code(status);
    if code == 0 {
        if !args.quiet {
            println!("Done in {:.2}s.", elapsed.as_secs_f64());
        }
        Ok(())
    } else {
        eprintln!("Failed with exit code {code}.");
        std::process::exit(code);
    }
}

fn run_delete(ctx: &Context, args: IdentArgs) -> Result<(), String> {
    let outcome = {
        let _lock = ctx.lock()?;
        delete_script(&ctx.layout, &Identifier::parse(&args.identifier))
            .map_err(|e| e.to_string())?;
        ctx.sync()?
    };
    println!("Script '{}' deleted.", args.identifier);
    report_sync(&outcome, ctx.layout.bin_dir());
    Ok(())
}

fn run_list(ctx: &Context) -> Result<(), String> {
    let scripts = list_scripts(&ctx.layout.source()).map_err(|e| e.to_string())?;
    if scripts.is_empty() {
        println!("No scripts found.");
        return Ok(());
    }

    for (namespace, title) in [
        (Namespace::Local, "Local scripts:"),
        (Namespace::Community, "Community scripts:"),
    ] {
        println!("{title}");
        for entry in scripts.iter().filter(|e| e.namespace == namespace) {
            let command = entry.command().unwrap_or_default();
            match entry.metadata.description() {
                Some(description) => println!("  {command} - {description}"),
                None => println!("  {command}"),
            }
        }
    }
    Ok(())
}

fn run_meta(ctx: &Context, args: MetaArgs) -> Result<(), String> {
    let entry = ctx.find(&args.identifier)?;
    if args.json {
        let json = serde_json::to_string_pretty(&entry.metadata)
            .map_err(|err| format!("JSON serialization failed: {err}"))?;
        println!("{json}");
    } else {
        for (key, value) in entry.metadata.iter() {
            println!("{key}: {value}");
        }
    }
    Ok(())
}

fn run_install(ctx: &Context, args: InstallArgs) -> Result<(), String> {
    let provider_dir = args.from.unwrap_or_else(|| ctx.config.provider_dir.clone());
    let provider = DirectoryProvider::new(provider_dir);

    let mut installer = Installer::new(&ctx.layout, &ctx.launcher, ctx.config.install);
    if args.force {
        installer = installer.with_collision_policy(CollisionPolicy::Overwrite);
    }

    let outcome = if args.yes {
        installer.install(&args.name, &provider, &mut |_: &str| true)
    } else {
        installer.install(&args.name, &provider, &mut stdin_confirm)
    }
    .map_err(|e| e.to_string())?;

    match outcome {
        InstallOutcome::Published { path, shims } => {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!("Community script '{name}' installed successfully.");
            report_sync(&shims, ctx.layout.bin_dir());
        }
        InstallOutcome::Aborted { quarantine } => {
            println!("Installation aborted.");
            debug!(quarantine = %quarantine.display(), "download kept in quarantine");
        }
    }
    Ok(())
}

fn run_prune(ctx: &Context, args: PruneArgs) -> Result<(), String> {
    let max_age = days(
        args.older_than_days
            .unwrap_or(ctx.config.quarantine.max_age_days),
    );
    let removed =
        prune_quarantine(&ctx.layout, max_age, SystemTime::now()).map_err(|e| e.to_string())?;
    println!("Removed {} quarantine file(s).", removed.len());
    Ok(())
}

fn run_index(args: IndexArgs) -> Result<(), String> {
    let index: CommunityIndex = build_index(&args.dir).map_err(|e| e.to_string())?;
    let output = args.output.unwrap_or_else(|| args.dir.join("index"));
    index.save(&output).map_err(|e| e.to_string())?;
    println!(
        "Index of {} script(s) created at {}",
        index.scripts.len(),
        output.display()
    );

    if let Some(readme) = args.readme {
        if update_readme(&readme, &index).map_err(|e| e.to_string())? {
            println!("Updated README at {}", readme.display());
        } else {
            eprintln!("warning: no script markers found in {}", readme.display());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn report_sync(outcome: &SyncOutcome, bin_dir: &Path) {
    match outcome {
        SyncOutcome::Empty => println!("No installed scripts found to link."),
        SyncOutcome::Linked(paths) => println!(
            "Successfully recreated shims for {} scripts in '{}'.",
            paths.len(),
            bin_dir.display()
        ),
    }
}

fn dir_on_path(dir: &Path) -> bool {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).any(|entry| entry == dir))
        .unwrap_or(false)
}

/// Runs `runner... <script> <args...>` with inherited stdio.
fn run_script(runner: &[String], script: &Path, args: &[String]) -> Result<ExitStatus, String> {
    let (program, runner_args) = runner
        .split_first()
        .ok_or_else(|| "No runner configured".to_string())?;
    debug!(runner = ?runner, script = %script.display(), args = ?args, "running script");
    std::process::Command::new(program)
        .args(runner_args)
        .arg(script)
        .args(args)
        .status()
        .map_err(|err| format!("Failed to start runner '{program}': {err}"))
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Opens `path` in `$EDITOR`, falling back to the configured editor.
fn open_editor(config: &ActConfig, path: &Path) -> Result<(), String> {
    let editor = std::env::var("EDITOR")
        .ok()
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| config.editor.clone());
    let mut parts = editor.split_whitespace();
    let program = parts
        .next()
        .ok_or_else(|| "No editor configured".to_string())?;

    let status = std::process::Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .map_err(|err| format!("Failed to start editor '{program}': {err}"))?;
    if !status.success() {
        return Err(format!("Editor '{program}' exited with {status}"));
    }
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String, String> {
    print!("{prompt}");
    io::stdout()
        .flush()
        .map_err(|err| format!("Failed to write prompt: {err}"))?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| format!("Failed to read input: {err}"))?;
    Ok(line.trim().to_string())
}

fn stdin_confirm(prompt: &str) -> bool {
    match prompt_line(&format!("{prompt} [y/N]: ")) {
        Ok(answer) => matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

fn pick_script(ctx: &Context) -> Result<ScriptEntry, String> {
    let mut scripts = list_scripts(&ctx.layout.source()).map_err(|e| e.to_string())?;
    if scripts.is_empty() {
        return Err("No installed scripts found.".to_string());
    }

    println!("Installed scripts:");
    for (idx, entry) in scripts.iter().enumerate() {
        println!("{}: {}", idx + 1, entry.qualified_name());
    }
    let choice = prompt_line("Enter the number of the script to run: ")?;
    match choice.parse::<usize>() {
        Ok(n) if (1..=scripts.len()).contains(&n) => Ok(scripts.swap_remove(n - 1)),
        _ => Err("Invalid selection.".to_string()),
    }
}
