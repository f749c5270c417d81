use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use javet_patcher::config::{builtin_set, load_from_path, BuiltinSet, TargetSet};
use javet_patcher::gn::{Arch, GnArgsGenerator, GnTarget, TargetOs};
use javet_patcher::node::{ArmFlagPatcher, MakefileSelection, NodeBuildPatcher, PointerAuthFlag};
use javet_patcher::v8::{LegacyV8BuildPatcher, V8BuildPatcher};
use javet_patcher::{
    AndroidMirror, PatchOutcome, TemporalPatcher, TreeGuard, Version, VersionUpdater,
    WriteOptions,
};
use similar::{ChangeTag, TextDiff};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "javet-patcher")]
#[command(about = "Version bumps and build-tree patches for Javet", long_about = None)]
#[command(version)]
struct Cli {
    /// Dry run - show what would be changed without modifying files
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Show unified diff of changes
    #[arg(short, long, global = true)]
    diff: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bump version strings across the Javet repository
    Version {
        /// Target set to update
        #[arg(value_enum)]
        set: VersionSet,

        /// Javet repository root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Version to write instead of the built-in one
        #[arg(long)]
        to: Option<String>,

        /// Custom target set file replacing the built-in definition
        #[arg(long)]
        targets: Option<PathBuf>,
    },

    /// Patch a configured Node.js tree for static PIC builds (Linux only)
    Node {
        /// Path to the Node.js repository
        #[arg(short, long)]
        path: PathBuf,

        /// Patch every generated makefile under out/, not just the known ones,
        /// adding the global-dynamic TLS model flags as well
        #[arg(long)]
        all_makefiles: bool,
    },

    /// Move arm64 pointer authentication flags into node.gyp (reads GCC_MAJOR_VERSION)
    NodeArm {
        /// Path to the Node.js repository
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Relax warning flags in V8 ninja files
    V8 {
        /// Path to the V8 repository
        #[arg(short, long)]
        path: PathBuf,

        /// Apply the Windows v8_wrappers workaround for older V8 versions
        #[arg(long)]
        legacy: bool,
    },

    /// Add a staticlib [lib] section to the temporal crates
    Temporal {
        /// Path to the temporal repository
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Sync the Android mirror of the Java sources
    Android {
        /// Javet repository root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Generate V8 args.gn files under scripts/v8/gn
    GnArgs {
        /// Javet repository root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Target OS (android, linux, macos, windows)
        #[arg(long)]
        os: Option<TargetOs>,

        /// Target architecture (arm, arm64, x86, x86_64)
        #[arg(long)]
        arch: Option<Arch>,

        /// Enable i18n support
        #[arg(long)]
        i18n: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum VersionSet {
    Javet,
    Node,
    V8,
    All,
}

impl VersionSet {
    fn builtin(self) -> Vec<BuiltinSet> {
        match self {
            VersionSet::Javet => vec![BuiltinSet::Javet],
            VersionSet::Node => vec![BuiltinSet::Node],
            VersionSet::V8 => vec![BuiltinSet::V8],
            VersionSet::All => BuiltinSet::ALL.to_vec(),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = WriteOptions {
        dry_run: cli.dry_run,
        keep_diff: cli.diff,
    };

    if options.dry_run {
        println!("{}", "[DRY RUN - no files will be written]".cyan());
    }

    match cli.command {
        Commands::Version {
            set,
            root,
            to,
            targets,
        } => cmd_version(set, root, to, targets, options),

        Commands::Node {
            path,
            all_makefiles,
        } => {
            let selection = if all_makefiles {
                MakefileSelection::All
            } else {
                MakefileSelection::Listed
            };
            let outcomes = NodeBuildPatcher::new(guard(&path)?, selection, options).patch()?;
            report("Node.js build", &outcomes, options);
            Ok(())
        }

        Commands::NodeArm { path } => {
            let flag = PointerAuthFlag::from_env()?;
            println!("Pointer authentication flag: {}", flag.to_string().bold());
            let outcomes = ArmFlagPatcher::new(guard(&path)?, flag, options).patch()?;
            report("Node.js arm64 flags", &outcomes, options);
            Ok(())
        }

        Commands::V8 { path, legacy } => {
            let tree = guard(&path)?;
            let outcomes = if legacy {
                LegacyV8BuildPatcher::new(tree, options).patch()?
            } else {
                V8BuildPatcher::new(tree, options).patch()?
            };
            report("V8 build", &outcomes, options);
            Ok(())
        }

        Commands::Temporal { path } => {
            let outcomes = TemporalPatcher::new(guard(&path)?, options).patch()?;
            report("temporal manifests", &outcomes, options);
            Ok(())
        }

        Commands::Android { root } => {
            let tree = guard(&resolve_root(root)?)?;
            let outcomes = AndroidMirror::new(tree, options).sync()?;
            report("Android mirror", &outcomes, options);
            Ok(())
        }

        Commands::GnArgs {
            root,
            os,
            arch,
            i18n,
        } => {
            let targets = GnTarget::select(os, arch, i18n)?;
            let tree = guard(&resolve_root(root)?)?;
            let outcomes = GnArgsGenerator::new(tree, options).generate(&targets)?;
            report("args.gn", &outcomes, options);
            Ok(())
        }
    }
}

fn cmd_version(
    set: VersionSet,
    root: Option<PathBuf>,
    to: Option<String>,
    targets: Option<PathBuf>,
    options: WriteOptions,
) -> Result<()> {
    let builtins = set.builtin();
    if builtins.len() > 1 && (to.is_some() || targets.is_some()) {
        bail!("--to and --targets apply to a single target set, not `all`");
    }

    let tree = guard(&resolve_root(root)?)?;
    let version = to.as_deref().map(Version::parse).transpose()?;

    for builtin in builtins {
        let mut target_set: TargetSet = match &targets {
            Some(file) => load_from_path(file)?,
            None => builtin_set(builtin)?,
        };
        if let Some(version) = &version {
            target_set = target_set.with_version(version.clone());
        }

        println!(
            "{}",
            format!("Target set: {} -> {}", target_set.name, target_set.version).bold()
        );
        let outcomes = VersionUpdater::from_set(&target_set).update(&tree, options)?;
        report(&target_set.name, &outcomes, options);
    }

    Ok(())
}

/// Resolve `--root`, falling back to the current directory.
fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(path) => Ok(path),
        None => Ok(env::current_dir()?),
    }
}

fn guard(path: &Path) -> Result<TreeGuard> {
    Ok(TreeGuard::new(path)?)
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => continue,
        };
        print!("{}", sign);
        if change.missing_newline() {
            println!();
        }
    }
}

fn report(title: &str, outcomes: &[PatchOutcome], options: WriteOptions) {
    let mut changed = 0;
    let mut unchanged = 0;
    let mut missing = 0;

    println!();
    println!("{}", format!("{title}:").bold());
    for outcome in outcomes {
        match outcome {
            PatchOutcome::Patched { file, change } => {
                let verb = if options.dry_run { "Would patch" } else { "Patched" };
                println!("{} {} {}", "✓".green(), verb, file.display());
                if let Some(change) = change {
                    display_diff(file, &change.before, &change.after);
                }
                changed += 1;
            }
            PatchOutcome::Created { file } => {
                let verb = if options.dry_run { "Would create" } else { "Created" };
                println!("{} {} {}", "✓".green(), verb, file.display());
                changed += 1;
            }
            PatchOutcome::Deleted { file } => {
                let verb = if options.dry_run { "Would delete" } else { "Deleted" };
                println!("{} {} {}", "✓".green(), verb, file.display());
                changed += 1;
            }
            PatchOutcome::Skipped { file } => {
                println!("{} Unchanged {}", "⊙".yellow(), file.display());
                unchanged += 1;
            }
            PatchOutcome::Missing { file } => {
                eprintln!("{} Missing {}", "✗".red(), file.display());
                missing += 1;
            }
        }
    }

    println!("{}", "Summary:".bold());
    println!("  {} changed", format!("{}", changed).green());
    println!("  {} unchanged", format!("{}", unchanged).yellow());
    println!("  {} missing", format!("{}", missing).red());
}
