//! WGSL validation ahead of module creation.
//!
//! `create_shader_module` reports WGSL errors through the device's uncaptured
//! error handler, which panics by default. Running naga first turns a bad
//! shader into a [`ShaderError`] the caller can fall back from.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader '{name}' failed to parse: {message}")]
    ParseFailed { name: String, message: String },

    #[error("shader '{name}' failed validation: {message}")]
    CompilationFailed { name: String, message: String },
}

/// Parse and validate `source` as WGSL.
pub fn validate_wgsl(name: &str, source: &str) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::ParseFailed {
        name: name.to_string(),
        message: e.emit_to_string(source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|e| ShaderError::CompilationFailed {
        name: name.to_string(),
        message: e.emit_to_string(source),
    })?;

    Ok(module)
}

/// Validate `source`, then create the shader module.
pub fn create_validated_module(
    device: &wgpu::Device,
    name: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    validate_wgsl(name, source)?;
    log::debug!("Shader '{}' validated", name);
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(name),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_SHADER: &str = r#"
        @vertex
        fn vs_main(@builtin(vertex_index) idx: u32) -> @builtin(position) vec4<f32> {
            return vec4<f32>(f32(idx), 0.0, 0.0, 1.0);
        }

        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            return vec4<f32>(1.0, 0.0, 0.0, 1.0);
        }
    "#;

    const UNDECLARED_IDENTIFIER: &str = r#"
        @vertex
        fn vs_main() -> @builtin(position) vec4<f32> {
            return undeclared_variable;
        }
    "#;

    const TYPE_MISMATCH: &str = r#"
        @fragment
        fn fs_main() -> @location(0) vec4<f32> {
            let x: f32 = 1u;
            return vec4<f32>(x);
        }
    "#;

    #[test]
    fn test_valid_shader_passes() {
        let module = validate_wgsl("valid", VALID_SHADER).unwrap();
        assert_eq!(module.entry_points.len(), 2);
    }

    #[test]
    fn test_undeclared_identifier_is_an_error() {
        let err = validate_wgsl("bad", UNDECLARED_IDENTIFIER).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("'bad'"), "{text}");
        assert!(text.contains("undeclared_variable"), "{text}");
    }

    #[test]
    fn test_type_mismatch_is_an_error() {
        assert!(validate_wgsl("mismatch", TYPE_MISMATCH).is_err());
    }

    #[test]
    fn test_builtin_sky_shaders_validate() {
        for (name, source) in crate::shaders::ALL {
            if let Err(e) = validate_wgsl(name, source) {
                panic!("{e}");
            }
        }
    }
}
