//! Named register maps and an explicit registry of modules.
//!
//! The registry is an ordinary value owned by the caller; nothing here is
//! process-wide. Binding a module to a handler and base address yields a
//! [`ModuleComm`] that addresses registers by name.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::{AxiError, Comm, Command, DeferredResult, FromValue, Handler, RegistryError};

/// Register names and word offsets of one module type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterMap {
    module: String,
    registers: BTreeMap<String, u32>,
}

impl RegisterMap {
    /// Creates an empty map for `module`.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            registers: BTreeMap::new(),
        }
    }

    /// Adds a register.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRegister`] when `name` is taken.
    pub fn with_register(mut self, name: impl Into<String>, offset: u32) -> Result<Self, RegistryError> {
        let name = name.into();
        if self.registers.contains_key(&name) {
            return Err(RegistryError::DuplicateRegister {
                module: self.module,
                register: name,
            });
        }
        self.registers.insert(name, offset);
        Ok(self)
    }

    /// Module name.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Offset of register `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownRegister`] when `name` is not declared.
    pub fn offset(&self, name: &str) -> Result<u32, RegistryError> {
        self.registers
            .get(name)
            .copied()
            .ok_or_else(|| RegistryError::UnknownRegister {
                module: self.module.clone(),
                register: name.to_string(),
            })
    }

    /// Registers in name order.
    pub fn registers(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.registers
            .iter()
            .map(|(name, offset)| (name.as_str(), *offset))
    }
}

/// Register maps keyed by module name.
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, RegisterMap>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module's register map.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateModule`] when the name is taken.
    pub fn register(&mut self, map: RegisterMap) -> Result<(), RegistryError> {
        if self.modules.contains_key(map.module()) {
            return Err(RegistryError::DuplicateModule(map.module));
        }
        log::debug!("registered module '{}' with {} registers", map.module, map.registers.len());
        self.modules.insert(map.module.clone(), map);
        Ok(())
    }

    /// Looks up a module's register map.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownModule`] when `module` is not registered.
    pub fn get(&self, module: &str) -> Result<&RegisterMap, RegistryError> {
        self.modules
            .get(module)
            .ok_or_else(|| RegistryError::UnknownModule(module.to_string()))
    }

    /// Registered module names in order.
    pub fn modules(&self) -> impl Iterator<Item = &str> + '_ {
        self.modules.keys().map(String::as_str)
    }

    /// Binds a module instance at `base_address` to `handler`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownModule`] when `module` is not registered.
    pub fn bind<'r, 'h, H: Handler + ?Sized>(
        &'r self,
        module: &str,
        base_address: u32,
        handler: &'h mut H,
    ) -> Result<ModuleComm<'r, 'h, H>, RegistryError> {
        Ok(ModuleComm {
            map: self.get(module)?,
            comm: Comm::new(handler, base_address),
        })
    }
}

/// Facade addressing one module instance's registers by name.
#[derive(Debug)]
pub struct ModuleComm<'r, 'h, H: Handler + ?Sized> {
    map: &'r RegisterMap,
    comm: Comm<'h, H>,
}

impl<'h, H: Handler + ?Sized> ModuleComm<'_, 'h, H> {
    /// Register map backing this facade.
    #[must_use]
    pub const fn map(&self) -> &RegisterMap {
        self.map
    }

    /// Offset-based facade for registers without a name.
    #[allow(clippy::missing_const_for_fn)]
    pub fn comm(&mut self) -> &mut Comm<'h, H> {
        &mut self.comm
    }

    /// Absolute address of register `name`.
    ///
    /// # Errors
    ///
    /// Returns a registry error for unknown names, or a config error on
    /// address overflow.
    pub fn address(&self, name: &str) -> Result<u32, AxiError> {
        Ok(self.comm.address(self.map.offset(name)?)?)
    }

    /// Sends a pre-built command.
    ///
    /// # Errors
    ///
    /// See [`Comm::submit`].
    pub fn submit<T: FromValue>(&mut self, command: Command) -> Result<DeferredResult<T>, AxiError> {
        self.comm.submit(command)
    }

    /// See [`Comm::fake_wait`].
    ///
    /// # Errors
    ///
    /// See [`Comm::fake_wait`].
    pub fn fake_wait(
        &mut self,
        clock_cycles: usize,
        sleep: Duration,
    ) -> Result<DeferredResult<()>, AxiError> {
        self.comm.fake_wait(clock_cycles, sleep)
    }

    /// Reads boolean register `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names or invalid addresses.
    pub fn get_boolean(&mut self, name: &str) -> Result<DeferredResult<bool>, AxiError> {
        let offset = self.map.offset(name)?;
        self.comm.get_boolean(offset)
    }

    /// Writes boolean register `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names or invalid addresses.
    pub fn set_boolean(&mut self, value: bool, name: &str) -> Result<DeferredResult<()>, AxiError> {
        let offset = self.map.offset(name)?;
        self.comm.set_boolean(value, offset)
    }

    /// Reads register `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names or invalid addresses.
    pub fn get_unsigned(&mut self, name: &str) -> Result<DeferredResult<u32>, AxiError> {
        let offset = self.map.offset(name)?;
        self.comm.get_unsigned(offset)
    }

    /// Reads a burst starting at register `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names or invalid bursts.
    pub fn get_unsigneds(
        &mut self,
        name: &str,
        length: usize,
        constant_address: bool,
    ) -> Result<DeferredResult<Vec<u32>>, AxiError> {
        let offset = self.map.offset(name)?;
        self.comm.get_unsigneds(offset, length, constant_address)
    }

    /// Writes register `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names, invalid addresses or values.
    pub fn set_unsigned(&mut self, value: i64, name: &str) -> Result<DeferredResult<()>, AxiError> {
        let offset = self.map.offset(name)?;
        self.comm.set_unsigned(value, offset)
    }

    /// Writes a burst starting at register `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names, invalid bursts or values.
    pub fn set_unsigneds(
        &mut self,
        values: &[i64],
        name: &str,
        constant_address: bool,
    ) -> Result<DeferredResult<()>, AxiError> {
        let offset = self.map.offset(name)?;
        self.comm.set_unsigneds(values, offset, constant_address)
    }

    /// Writes a two's-complement value to register `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names, invalid addresses or values.
    pub fn set_signed(&mut self, value: i64, name: &str) -> Result<DeferredResult<()>, AxiError> {
        let offset = self.map.offset(name)?;
        self.comm.set_signed(value, offset)
    }

    /// Pulses trigger register `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names or invalid addresses.
    pub fn trigger(&mut self, name: &str) -> Result<DeferredResult<()>, AxiError> {
        let offset = self.map.offset(name)?;
        self.comm.trigger(offset)
    }
}
