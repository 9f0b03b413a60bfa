//! # Kernel-call primitive and the Physical Word Accessor

use crate::{KernelCallError, VmProtection};
use memctl_addresses::{PhysicalAddress, VirtualAddress};
use memctl_info::KernelFunctions;
use memctl_vmem::PhysicalWords;

/// Most arguments the kernel-call primitive can pass.
pub const MAX_KERNEL_CALL_ARGS: usize = 7;

/// Calls a kernel function by address and returns its 64-bit result.
///
/// Implementors provide [`invoke`](Self::invoke); callers use
/// [`call`](Self::call), which enforces the argument limit first.
pub trait KernelCall {
    /// Perform the call. `args` never holds more than [`MAX_KERNEL_CALL_ARGS`] values.
    ///
    /// # Errors
    /// [`KernelCallError::Failed`] if the primitive could not run the call.
    fn invoke(&self, function: VirtualAddress, args: &[u64]) -> Result<u64, KernelCallError>;

    /// Call `function` with `args`.
    ///
    /// # Errors
    /// - [`KernelCallError::TooManyArguments`] for more than seven arguments.
    /// - Whatever [`invoke`](Self::invoke) reports.
    fn call(&self, function: VirtualAddress, args: &[u64]) -> Result<u64, KernelCallError> {
        if args.len() > MAX_KERNEL_CALL_ARGS {
            return Err(KernelCallError::TooManyArguments { given: args.len() });
        }
        self.invoke(function, args)
    }
}

impl<T> KernelCall for &T
where
    T: KernelCall + ?Sized,
{
    fn invoke(&self, function: VirtualAddress, args: &[u64]) -> Result<u64, KernelCallError> {
        (**self).invoke(function, args)
    }
}

/// The generic (Mach-style) protection change of the target kernel.
pub trait ProtectionChanger {
    /// Change the protection of `[address, address + size)`.
    ///
    /// # Errors
    /// The primitive's failure.
    fn grant_protection(
        &self,
        address: VirtualAddress,
        size: u64,
        protection: VmProtection,
    ) -> Result<(), KernelCallError>;
}

/// Reads and writes 64-bit physical words as two 32-bit transfers through
/// `ml_phys_read_data` / `ml_phys_write_data`.
///
/// The low half is always transferred first, then the high half at `+4`.
/// No validation happens here and failures are never retried.
pub struct PhysicalWordAccessor<'k, K>
where
    K: KernelCall + ?Sized,
{
    kernel: &'k K,
    functions: KernelFunctions,
}

impl<'k, K> PhysicalWordAccessor<'k, K>
where
    K: KernelCall + ?Sized,
{
    const HALF: u64 = 4;

    #[must_use]
    pub const fn new(kernel: &'k K, functions: KernelFunctions) -> Self {
        Self { kernel, functions }
    }

    fn high_half(address: PhysicalAddress) -> Result<PhysicalAddress, KernelCallError> {
        address
            .checked_add(Self::HALF)
            .ok_or(KernelCallError::OutOfRange(address))
    }

    fn read32(&self, address: PhysicalAddress) -> Result<u64, KernelCallError> {
        let value = self.kernel.call(
            self.functions.phys_read_data,
            &[address.as_u64(), Self::HALF],
        )?;
        Ok(value & 0xFFFF_FFFF)
    }

    fn write32(&self, address: PhysicalAddress, value: u64) -> Result<(), KernelCallError> {
        self.kernel.call(
            self.functions.phys_write_data,
            &[address.as_u64(), value & 0xFFFF_FFFF, Self::HALF],
        )?;
        Ok(())
    }
}

impl<K> PhysicalWords for PhysicalWordAccessor<'_, K>
where
    K: KernelCall + ?Sized,
{
    type Error = KernelCallError;

    fn read64(&self, address: PhysicalAddress) -> Result<u64, Self::Error> {
        let high = Self::high_half(address)?;
        let lo = self.read32(address)?;
        let hi = self.read32(high)?;
        Ok((hi << 32) | lo)
    }

    fn write64(&self, address: PhysicalAddress, value: u64) -> Result<(), Self::Error> {
        let high = Self::high_half(address)?;
        self.write32(address, value)?;
        self.write32(high, value >> 32)
    }
}
