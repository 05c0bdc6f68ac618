//! Injected collaborator services.

use std::fmt;
use std::sync::Arc;

use crate::deband::{Debander, GradientDeband};
use crate::fill::{EdgeFill, FillMargins};
use crate::levels::{LineLevels, LumaLineLevels};
use crate::resample::{CpuResampler, Resampler};

/// The collaborators an orchestrator is built with.
#[derive(Clone)]
pub struct Services {
    pub resampler: Arc<dyn Resampler>,
    pub edge_fill: Arc<dyn EdgeFill>,
    pub line_levels: Arc<dyn LineLevels>,
    pub debander: Arc<dyn Debander>,
}

impl Services {
    /// CPU implementations of every service.
    pub fn cpu() -> Self {
        Self {
            resampler: Arc::new(CpuResampler),
            edge_fill: Arc::new(FillMargins),
            line_levels: Arc::new(LumaLineLevels),
            debander: Arc::new(GradientDeband),
        }
    }

    /// Replace the resampler.
    pub fn with_resampler(mut self, resampler: Arc<dyn Resampler>) -> Self {
        self.resampler = resampler;
        self
    }

    /// Replace the debander.
    pub fn with_debander(mut self, debander: Arc<dyn Debander>) -> Self {
        self.debander = debander;
        self
    }
}

impl Default for Services {
    fn default() -> Self {
        Self::cpu()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
