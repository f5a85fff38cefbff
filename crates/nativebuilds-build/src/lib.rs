//! NativeBuilds packaging
//!
//! Everything that happens after the installer ran:
//! - normalization of raw per-target output into the packaged layout
//! - Gradle build descriptors and companion metadata per library
//! - shared-library staging for JVM and Android
//! - overlay triplets, archives and the installer interface

pub mod archive;
pub mod descriptor;
pub mod error;
pub mod fingerprint;
pub mod install;
pub mod layout;
pub mod normalize;
pub mod pipeline;
pub mod staging;
pub mod triplets;

// Re-export main types
pub use archive::{archive_headers, archive_name, archive_package, archive_target};
pub use descriptor::{
    library_names, static_library_file, BuildScriptGenerator, LibraryDescriptor, Variant,
};
pub use error::{BuildError, BuildResult};
pub use fingerprint::tree_fingerprint;
pub use install::{Installer, VcpkgInstaller};
pub use layout::{Layout, Linkage};
pub use normalize::{collapse_symlinks, ArtifactNormalizer, NormalizeJob, NormalizeReport};
pub use pipeline::{GenerateReport, Pipeline};
pub use staging::{LibraryMetadata, SharedLibStager, StagedLibrary};
pub use triplets::OverlayTriplets;
