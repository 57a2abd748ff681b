//! Script storage, resolution and shims for the `act` script manager.
//!
//! Builds on [`act_core`] header parsing to manage a directory of scripts:
//!
//! - [`find_script`] resolves `weather` or `community:weather` to one
//!   script, local scripts first.
//! - [`synchronize_shims`] regenerates one executable per command in the
//!   shim directory.
//! - [`Installer`] fetches, quarantines, validates and publishes community
//!   scripts.
//! - [`build_index`] and [`update_readme`] maintain a community repository
//!   listing.
//!
//! All lookups go through a [`ScriptSource`]: [`FsSource`] over a
//! [`Layout`], or [`MemorySource`] for tests.
//!
//! # Quick start
//!
//! ```no_run
//! use act_core::Identifier;
//! use act_registry::{Layout, ShimLauncher, find_script, synchronize_shims};
//!
//! let layout = Layout::new(Layout::default_root());
//! let entry = find_script(&layout.source(), &Identifier::parse("weather")).unwrap();
//! println!("{}", entry.path.display());
//!
//! let launcher = ShimLauncher::new("/usr/local/bin/act");
//! synchronize_shims(&layout.source(), layout.bin_dir(), &launcher).unwrap();
//! ```

mod config;
mod error;
mod index;
mod install;
mod layout;
mod lock;
mod quarantine;
mod resolver;
mod scripts;
mod shims;
mod source;

pub use config::{ActConfig, CollisionPolicy, InstallConfig, QuarantineConfig, SanitizePolicy};
pub use error::{RegistryError, Result};
pub use index::{CommunityIndex, IndexEntry, README_END, README_START, build_index, update_readme};
pub use install::{
    Confirm, DirectoryProvider, FetchError, InstallOutcome, InstallStage, Installer,
    ScriptProvider, risk_prompt, sanitize_script_name,
};
pub use layout::Layout;
pub use lock::RegistryLock;
pub use quarantine::{days, prune_quarantine};
pub use resolver::{ScriptEntry, find_script, list_scripts, load_script, scan_namespace};
pub use scripts::{PLACEHOLDER_AUTHOR, create_local_script, delete_script, script_template};
pub use shims::{ShimLauncher, ShimSet, SyncOutcome, plan_shims, synchronize_shims};
pub use source::{FsSource, MemorySource, SCRIPT_EXTENSION, ScriptSource};
