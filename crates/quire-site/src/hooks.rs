//! Lifecycle hooks and plugins.

use std::fmt;

use quire_config::Config;

/// Lifecycle phase a hook runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the router starts.
    Init,
    /// After the router is initialized, before the first fetch.
    Mounted,
    /// Receives the page Markdown before compilation.
    BeforeEach,
    /// Receives the compiled HTML before it is painted.
    AfterEach,
    /// After a navigation cycle finished painting.
    DoneEach,
    /// After the first navigation cycle.
    Ready,
}

impl Phase {
    pub const ALL: [Phase; 6] = [
        Phase::Init,
        Phase::Mounted,
        Phase::BeforeEach,
        Phase::AfterEach,
        Phase::DoneEach,
        Phase::Ready,
    ];

    fn slot(self) -> usize {
        match self {
            Phase::Init => 0,
            Phase::Mounted => 1,
            Phase::BeforeEach => 2,
            Phase::AfterEach => 3,
            Phase::DoneEach => 4,
            Phase::Ready => 5,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Mounted => "mounted",
            Phase::BeforeEach => "beforeEach",
            Phase::AfterEach => "afterEach",
            Phase::DoneEach => "doneEach",
            Phase::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Outcome of one hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFlow {
    /// `false` ends the chain; the dependent step is skipped.
    pub proceed: bool,
    /// Data handed to the next hook.
    pub data: String,
}

impl HookFlow {
    /// Continue with `data`.
    #[must_use]
    pub fn next(data: impl Into<String>) -> Self {
        Self {
            proceed: true,
            data: data.into(),
        }
    }

    /// Stop the chain.
    #[must_use]
    pub fn stop(data: impl Into<String>) -> Self {
        Self {
            proceed: false,
            data: data.into(),
        }
    }
}

type Hook = Box<dyn FnMut(String) -> HookFlow + Send>;

/// Append-only hook lists per phase.
#[derive(Default)]
pub struct HookRegistry {
    hooks: [Vec<Hook>; 6],
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for phase in Phase::ALL {
            map.entry(&phase, &self.hooks[phase.slot()].len());
        }
        map.finish()
    }
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `hook` to run after the hooks already registered for `phase`.
    pub fn add<F>(&mut self, phase: Phase, hook: F)
    where
        F: FnMut(String) -> HookFlow + Send + 'static,
    {
        self.hooks[phase.slot()].push(Box::new(hook));
    }

    /// Number of hooks registered for `phase`.
    #[must_use]
    pub fn len(&self, phase: Phase) -> usize {
        self.hooks[phase.slot()].len()
    }

    /// Run the hooks of `phase` in registration order.
    ///
    /// Each hook receives the data returned by the previous one. The first
    /// stop ends the chain. Without hooks `data` passes through.
    pub fn call_hook(&mut self, phase: Phase, data: impl Into<String>) -> HookFlow {
        let mut flow = HookFlow::next(data);
        for (position, hook) in self.hooks[phase.slot()].iter_mut().enumerate() {
            flow = hook(flow.data);
            if !flow.proceed {
                tracing::debug!(%phase, position, "Hook stopped the chain");
                break;
            }
        }
        flow
    }
}

/// Extension installed at startup.
pub trait Plugin: Send {
    fn name(&self) -> &str;

    /// Register hooks. Runs once, before `init`.
    fn install(&self, hooks: &mut HookRegistry, config: &Config);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_empty_chain_passes_through() {
        let mut hooks = HookRegistry::new();
        assert_eq!(hooks.call_hook(Phase::BeforeEach, "md"), HookFlow::next("md"));
    }

    #[test]
    fn test_hooks_run_in_registration_order() {
        let mut hooks = HookRegistry::new();
        hooks.add(Phase::AfterEach, |html| HookFlow::next(format!("{html}a")));
        hooks.add(Phase::AfterEach, |html| HookFlow::next(format!("{html}b")));
        assert_eq!(hooks.call_hook(Phase::AfterEach, "x").data, "xab");
    }

    #[test]
    fn test_stop_ends_chain() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);

        let mut hooks = HookRegistry::new();
        hooks.add(Phase::BeforeEach, |md: String| HookFlow::stop(md));
        hooks.add(Phase::BeforeEach, move |md| {
            *counter.lock().unwrap() += 1;
            HookFlow::next(md)
        });

        let flow = hooks.call_hook(Phase::BeforeEach, "md");
        assert!(!flow.proceed);
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_phases_are_separate() {
        let mut hooks = HookRegistry::new();
        hooks.add(Phase::Init, |_| HookFlow::stop(""));
        assert_eq!(hooks.len(Phase::Init), 1);
        assert_eq!(hooks.len(Phase::Ready), 0);
        assert!(hooks.call_hook(Phase::Ready, "").proceed);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::BeforeEach.to_string(), "beforeEach");
        assert_eq!(Phase::DoneEach.to_string(), "doneEach");
    }
}
