use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid vector '{0}'. Expected three comma-separated numbers (e.g., '80.64,2.39,4.29').")]
    InvalidVectorFormat(String),

    #[error("Component '{component}' of '{input}' is not a finite number.")]
    InvalidComponent { component: String, input: String },
}

/// Parses `x,y,z` into three finite floats. Whitespace around components is ignored.
pub fn parse_vec3(input: &str) -> Result<[f64; 3], ParseError> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(ParseError::InvalidVectorFormat(input.to_string()));
    };

    let parse = |component: &str| -> Result<f64, ParseError> {
        component
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParseError::InvalidComponent {
                component: component.to_string(),
                input: input.to_string(),
            })
    };

    Ok([parse(x)?, parse(y)?, parse(z)?])
}
