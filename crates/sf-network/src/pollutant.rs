/// A routed pollutant and the default concentrations of the inflows that carry it.
#[derive(Debug, Clone, PartialEq)]
pub struct Pollutant {
    pub name: String,
    /// Concentration in dry-weather flow unless a node overrides it.
    pub dwf_concen: f64,
    pub gw_concen: f64,
    pub rdii_concen: f64,
}

impl Pollutant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dwf_concen: 0.0,
            gw_concen: 0.0,
            rdii_concen: 0.0,
        }
    }
}
