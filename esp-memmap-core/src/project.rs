//! The project description and SDK configuration external collaborators:
//! metadata the build system produces that the builder reads but never
//! derives on its own (component directories, the app ELF path, whether
//! link-time optimization ran).

use indexmap::IndexMap;
use serde::Deserialize;

/// Build metadata for a single component (an archive's source directory and
/// the build-directory-relative archive file it produced).
#[derive(Clone, Debug, Deserialize)]
pub struct BuildComponentInfo {
    /// Path to the component's archive, relative to the build directory.
    pub file: String,
    /// The component's source directory.
    pub dir: String,
}

/// The subset of a build system's project description the memory-map
/// builder needs to expand `(exe)` input sections into their owning
/// component (§4.3 Stage 0).
#[derive(Clone, Debug, Deserialize)]
pub struct ProjectDescription {
    pub target: String,
    pub build_dir: String,
    pub app_elf: String,
    pub project_name: String,
    pub build_component_info: IndexMap<String, BuildComponentInfo>,
}

/// The subset of `sdkconfig` that influences the builder: whether
/// link-time optimization merged object files into the executable directly,
/// in which case DWARF-based expansion is required to recover per-component
/// attribution.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SdkConfig {
    #[serde(rename = "COMPILER_LTO_LINKTIME", default)]
    pub compiler_lto_linktime: bool,
}
