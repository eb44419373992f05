//! Synchronous tap registries used by the compiler, the compilation and the
//! module factory.
//!
//! Plugins subscribe with [`SyncHook::tap`]; the host fires the hook with
//! [`SyncHook::call`]. Taps run in registration order and the first error
//! stops the chain.

use std::fmt;

use anyhow::{Context, Result};

type TapFn<T> = Box<dyn Fn(&mut T) -> Result<()>>;

struct Tap<T> {
    name: String,
    callback: TapFn<T>,
}

pub struct SyncHook<T> {
    taps: Vec<Tap<T>>,
}

impl<T> Default for SyncHook<T> {
    fn default() -> Self {
        Self { taps: Vec::new() }
    }
}

impl<T> fmt::Debug for SyncHook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.taps.iter().map(|tap| &tap.name))
            .finish()
    }
}

impl<T> SyncHook<T> {
    pub fn tap<F>(&mut self, name: impl Into<String>, callback: F)
    where
        F: Fn(&mut T) -> Result<()> + 'static,
    {
        self.taps.push(Tap {
            name: name.into(),
            callback: Box::new(callback),
        });
    }

    pub fn call(&self, arg: &mut T) -> Result<()> {
        for tap in &self.taps {
            (tap.callback)(arg).with_context(|| format!("Plugin '{}' failed", tap.name))?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}
