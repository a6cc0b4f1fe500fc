/*
 *  platform/selector.rs
 *
 *  longship - module-first engine core
 *  (c) 2026 Longship Engine Team
 *
 *  Scored platform/backend candidate table and selection
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::fmt;
use std::sync::OnceLock;

use longship_sdk::{critical, debug, info, warn};
use thiserror::Error;

use super::{BackendType, PlatformManager, PlatformRequest, PlatformType};
use crate::logging::EngineConfig;

/// Score of a candidate that must never be picked. Lower is better.
pub const INVALID_SCORE: u16 = u16::MAX;

/// Creation entry point of a candidate; `None` means creation failed
pub type CreateFn = fn() -> Option<Box<dyn PlatformManager>>;

#[derive(Clone, Copy)]
pub struct Candidate {
    pub platform: PlatformType,
    pub backend: BackendType,
    pub create: Option<CreateFn>,
    pub score: u16,
}

impl Candidate {
    /// Candidate scored against this build's supported lists
    pub fn scored(platform: PlatformType, backend: BackendType, create: Option<CreateFn>) -> Self {
        let score = combined_score(
            platform_score(supported_platforms(), platform),
            backend_score(supported_backends(), backend),
        );
        Self {
            platform,
            backend,
            create,
            score,
        }
    }

    pub fn matches(&self, request: PlatformRequest) -> bool {
        let platform = request.platform == PlatformType::NoPreference || request.platform == self.platform;
        let backend = request.backend == BackendType::NoPreference || request.backend == self.backend;
        platform && backend
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("platform", &self.platform)
            .field("backend", &self.backend)
            .field("create", &self.create.is_some())
            .field("score", &self.score)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("no suitable platform/backend configuration for {platform} + {backend}")]
    NoCandidate {
        platform: PlatformType,
        backend: BackendType,
    },

    #[error("selected configuration {platform} + {backend} has no creation function")]
    MissingEntryPoint {
        platform: PlatformType,
        backend: BackendType,
    },

    #[error("creating platform {platform} + {backend} failed")]
    CreationFailed {
        platform: PlatformType,
        backend: BackendType,
    },
}

/// Platforms compiled into this build, most preferred first
pub fn supported_platforms() -> &'static [PlatformType] {
    &[
        #[cfg(feature = "glfw-vulkan")]
        PlatformType::Glfw,
        #[cfg(feature = "headless")]
        PlatformType::Headless,
    ]
}

/// Backends compiled into this build, most preferred first
pub fn supported_backends() -> &'static [BackendType] {
    &[
        #[cfg(feature = "glfw-vulkan")]
        BackendType::Vulkan,
        #[cfg(feature = "headless")]
        BackendType::Null,
    ]
}

/// 1-based rank of `platform` in `supported`, or [`INVALID_SCORE`]
pub fn platform_score(supported: &[PlatformType], platform: PlatformType) -> u16 {
    rank(supported.iter().position(|p| *p == platform))
}

/// 1-based rank of `backend` in `supported`, or [`INVALID_SCORE`]
pub fn backend_score(supported: &[BackendType], backend: BackendType) -> u16 {
    rank(supported.iter().position(|b| *b == backend))
}

fn rank(position: Option<usize>) -> u16 {
    position
        .and_then(|i| u16::try_from(i + 1).ok())
        .unwrap_or(INVALID_SCORE)
}

/// Product of the two ranks, saturating at [`INVALID_SCORE`]
pub fn combined_score(platform: u16, backend: u16) -> u16 {
    if platform == INVALID_SCORE || backend == INVALID_SCORE {
        return INVALID_SCORE;
    }
    platform.saturating_mul(backend)
}

/// The candidate table of this build, built on first use
pub fn available_configurations() -> &'static [Candidate] {
    static TABLE: OnceLock<Vec<Candidate>> = OnceLock::new();

    TABLE.get_or_init(|| {
        #[allow(unused_mut)]
        let mut table = Vec::new();

        #[cfg(feature = "glfw-vulkan")]
        table.push(Candidate::scored(
            PlatformType::Glfw,
            BackendType::Vulkan,
            Some(crate::plugin::create_glfw_vulkan as CreateFn),
        ));

        #[cfg(feature = "headless")]
        table.push(Candidate::scored(
            PlatformType::Headless,
            BackendType::Null,
            Some(crate::plugin::create_headless as CreateFn),
        ));

        table
    })
}

/// Pick the candidate for `request` without creating anything.
///
/// The lowest score among matching candidates wins, earlier entries on ties.
/// With no usable match the whole table is searched for the lowest valid
/// score that also has a creation function.
pub fn choose(table: &[Candidate], request: PlatformRequest) -> Result<&Candidate, SelectError> {
    let mut preferred: Option<&Candidate> = None;
    let mut best = INVALID_SCORE;

    for candidate in table.iter().filter(|c| c.matches(request)) {
        if candidate.score < best {
            best = candidate.score;
            preferred = Some(candidate);
        }
    }

    if let Some(candidate) = preferred {
        debug!(EngineConfig, "Found requested configuration with score {} (lower is better)", candidate.score);
        return Ok(candidate);
    }

    warn!(
        EngineConfig,
        "Requested configuration {} + {} is unsuitable or not found, trying the best available match",
        request.platform,
        request.backend
    );

    let fallback = table
        .iter()
        .filter(|c| c.score != INVALID_SCORE && c.create.is_some())
        .min_by_key(|c| c.score);

    match fallback {
        Some(candidate) => {
            info!(EngineConfig, "Falling back to configuration with score {} (lower is better)", candidate.score);
            Ok(candidate)
        }
        None => {
            critical!(EngineConfig, "No suitable platform/backend configuration found in the table");
            Err(SelectError::NoCandidate {
                platform: request.platform,
                backend: request.backend,
            })
        }
    }
}

/// Choose a candidate for `request` and create its platform manager.
pub fn select_platform(
    table: &[Candidate],
    request: PlatformRequest,
) -> Result<Box<dyn PlatformManager>, SelectError> {
    info!(EngineConfig, "Attempting to select platform: {}", request.platform);
    info!(EngineConfig, "Attempting to select backend: {}", request.backend);

    let candidate = choose(table, request)?;
    info!(EngineConfig, "Selected platform: {}", candidate.platform);
    info!(EngineConfig, "Selected backend: {}", candidate.backend);

    let Some(create) = candidate.create else {
        critical!(EngineConfig, "Selected configuration has no platform creation function");
        return Err(SelectError::MissingEntryPoint {
            platform: candidate.platform,
            backend: candidate.backend,
        });
    };

    match create() {
        Some(manager) => Ok(manager),
        None => {
            critical!(EngineConfig, "Platform creation function returned nothing");
            Err(SelectError::CreationFailed {
                platform: candidate.platform,
                backend: candidate.backend,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{PlatformError, WindowCreateInfo, WindowId};

    struct Dummy;

    impl PlatformManager for Dummy {
        fn platform_type(&self) -> PlatformType {
            PlatformType::Glfw
        }
        fn backend_type(&self) -> BackendType {
            BackendType::Vulkan
        }
        fn name(&self) -> &str {
            "dummy"
        }
        fn create_window(&mut self, _info: &WindowCreateInfo) -> Result<WindowId, PlatformError> {
            Ok(WindowId(0))
        }
        fn attach_renderer(&mut self, _window: WindowId) -> Result<bool, PlatformError> {
            Ok(false)
        }
        fn poll_events(&mut self) {}
        fn present(&mut self) -> Result<(), PlatformError> {
            Ok(())
        }
    }

    fn create_dummy() -> Option<Box<dyn PlatformManager>> {
        Some(Box::new(Dummy))
    }

    fn create_nothing() -> Option<Box<dyn PlatformManager>> {
        None
    }

    fn candidate(platform: PlatformType, backend: BackendType, score: u16, create: Option<CreateFn>) -> Candidate {
        Candidate {
            platform,
            backend,
            create,
            score,
        }
    }

    #[test]
    fn test_lowest_score_among_duplicates() {
        let table = [
            candidate(PlatformType::Glfw, BackendType::Vulkan, 10, Some(create_dummy)),
            candidate(PlatformType::Glfw, BackendType::Vulkan, 5, Some(create_dummy)),
        ];

        let chosen = choose(&table, PlatformRequest::new(PlatformType::Glfw, BackendType::Vulkan)).unwrap();
        assert_eq!(chosen.score, 5);
        assert!(std::ptr::eq(chosen, &table[1]));
    }

    #[test]
    fn test_empty_table_fails() {
        let result = select_platform(&[], PlatformRequest::ANY);
        assert!(matches!(result, Err(SelectError::NoCandidate { .. })));
    }

    #[test]
    fn test_ties_keep_table_order() {
        let table = [
            candidate(PlatformType::Headless, BackendType::Null, 3, Some(create_dummy)),
            candidate(PlatformType::Glfw, BackendType::Vulkan, 3, Some(create_dummy)),
        ];

        let chosen = choose(&table, PlatformRequest::ANY).unwrap();
        assert_eq!(chosen.platform, PlatformType::Headless);
    }

    #[test]
    fn test_wildcard_on_one_side() {
        let table = [
            candidate(PlatformType::Glfw, BackendType::Vulkan, 1, Some(create_dummy)),
            candidate(PlatformType::Headless, BackendType::Null, 2, Some(create_dummy)),
        ];

        let request = PlatformRequest::new(PlatformType::NoPreference, BackendType::Null);
        assert_eq!(choose(&table, request).unwrap().platform, PlatformType::Headless);
    }

    #[test]
    fn test_fallback_skips_invalid_and_missing_entry_points() {
        let table = [
            candidate(PlatformType::Glfw, BackendType::Vulkan, INVALID_SCORE, Some(create_dummy)),
            candidate(PlatformType::X11, BackendType::OpenGl, 1, None),
            candidate(PlatformType::Headless, BackendType::Null, 4, Some(create_dummy)),
        ];

        // The only GLFW match carries the invalid score.
        let request = PlatformRequest::new(PlatformType::Glfw, BackendType::Vulkan);
        assert_eq!(choose(&table, request).unwrap().platform, PlatformType::Headless);
    }

    #[test]
    fn test_matching_candidate_without_entry_point() {
        let table = [
            candidate(PlatformType::X11, BackendType::OpenGl, 1, None),
            candidate(PlatformType::Headless, BackendType::Null, 4, Some(create_dummy)),
        ];

        let request = PlatformRequest::new(PlatformType::X11, BackendType::OpenGl);
        let result = select_platform(&table, request);
        assert!(matches!(result, Err(SelectError::MissingEntryPoint { platform: PlatformType::X11, .. })));
    }

    #[test]
    fn test_null_creation_is_distinct_failure() {
        let table = [candidate(PlatformType::Glfw, BackendType::Vulkan, 1, Some(create_nothing))];
        let result = select_platform(&table, PlatformRequest::ANY);
        assert!(matches!(result, Err(SelectError::CreationFailed { .. })));
    }

    #[test]
    fn test_successful_selection() {
        let table = [candidate(PlatformType::Glfw, BackendType::Vulkan, 1, Some(create_dummy))];
        let manager = select_platform(&table, PlatformRequest::ANY).unwrap();
        assert_eq!(manager.name(), "dummy");
    }

    #[test]
    fn test_scores() {
        let platforms = [PlatformType::Glfw, PlatformType::Headless];
        let backends = [BackendType::Vulkan, BackendType::Null];

        assert_eq!(platform_score(&platforms, PlatformType::Headless), 2);
        assert_eq!(backend_score(&backends, BackendType::Vulkan), 1);
        assert_eq!(platform_score(&platforms, PlatformType::Cocoa), INVALID_SCORE);
        assert_eq!(combined_score(2, 3), 6);
        assert_eq!(combined_score(INVALID_SCORE, 1), INVALID_SCORE);
        assert_eq!(combined_score(1000, 1000), INVALID_SCORE);
    }

    #[cfg(feature = "headless")]
    #[test]
    fn test_build_table_contains_headless() {
        let table = available_configurations();
        let headless = table
            .iter()
            .find(|c| c.platform == PlatformType::Headless)
            .unwrap();
        assert_eq!(headless.backend, BackendType::Null);
        assert_ne!(headless.score, INVALID_SCORE);
        assert!(headless.create.is_some());
    }
}
