//! Utilities.
use anyhow::{anyhow, Result};
use candle_nn::VarMap;
use log::trace;
use volta_core::error::VoltaError;

/// Copies every variable of `src` into the variable of the same name in `dest`.
///
/// The copy is by value: updating `src` afterwards leaves `dest` unchanged.
pub fn copy_varmap(dest: &VarMap, src: &VarMap) -> Result<()> {
    trace!("dest");
    let dest = dest
        .data()
        .lock()
        .map_err(|e| anyhow!("Failed to lock varmap: {}", e))?;
    trace!("src");
    let src = src
        .data()
        .lock()
        .map_err(|e| anyhow!("Failed to lock varmap: {}", e))?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src.get(k_dest).ok_or_else(|| {
            VoltaError::Configuration(format!("Variable {} is missing in the source", k_dest))
        })?;
        v_dest
            .set(v_src.as_tensor())
            .map_err(|e| VoltaError::Configuration(e.to_string()))?;
    }

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> usize;

    /// Sets the output dimension.
    fn set_out_dim(&mut self, v: usize);
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device, Tensor};
    use candle_nn::Init;

    fn varmap_with(values: &[f32]) -> Result<VarMap> {
        let vm = VarMap::new();
        let init = Init::Randn {
            mean: 0.0,
            stdev: 1.0,
        };
        vm.get((values.len(),), "var1", init, DType::F32, &Device::Cpu)?;
        let t = Tensor::from_slice(values, (values.len(),), &Device::Cpu)?;
        vm.data().lock().unwrap().get("var1").unwrap().set(&t)?;
        Ok(vm)
    }

    fn values(vm: &VarMap) -> Result<Vec<f32>> {
        let t = vm
            .data()
            .lock()
            .unwrap()
            .get("var1")
            .unwrap()
            .as_tensor()
            .clone();
        Ok(t.to_vec1::<f32>()?)
    }

    #[test]
    fn test_copy_varmap_is_deep() -> Result<()> {
        let vm_src = varmap_with(&[1.0, 2.0, 3.0])?;
        let vm_dest = varmap_with(&[4.0, 5.0, 6.0])?;
        copy_varmap(&vm_dest, &vm_src)?;
        assert_eq!(values(&vm_dest)?, vec![1.0, 2.0, 3.0]);

        // Mutating the source must not leak into the copy
        let t = Tensor::from_slice(&[7.0f32, 8.0, 9.0], (3,), &Device::Cpu)?;
        vm_src.data().lock().unwrap().get("var1").unwrap().set(&t)?;
        assert_eq!(values(&vm_dest)?, vec![1.0, 2.0, 3.0]);
        Ok(())
    }

    #[test]
    fn test_copy_varmap_shape_mismatch() -> Result<()> {
        let vm_src = varmap_with(&[1.0, 2.0])?;
        let vm_dest = varmap_with(&[4.0, 5.0, 6.0])?;
        let err = copy_varmap(&vm_dest, &vm_src).unwrap_err();
        assert!(matches!(
            VoltaError::classify(&err),
            Some(VoltaError::Configuration(_))
        ));
        Ok(())
    }
}
