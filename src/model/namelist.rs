use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::Value;

/// One named namelist group: an ordered mapping of parameter name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamelistGroup {
    params: IndexMap<String, Value>,
}

impl NamelistGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, param: &str) -> Option<&Value> {
        self.params.get(param)
    }

    pub fn set(&mut self, param: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(param.into(), value.into());
    }

    pub fn remove(&mut self, param: &str) -> Option<Value> {
        self.params.shift_remove(param)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for NamelistGroup {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            params: iter.into_iter().collect(),
        }
    }
}

/// Contents of a single `.nml` file: an ordered mapping of group name to
/// [`NamelistGroup`]. Group names are unique within a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Namelist {
    groups: IndexMap<String, NamelistGroup>,
}

impl Namelist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(&self, name: &str) -> Option<&NamelistGroup> {
        self.groups.get(name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut NamelistGroup> {
        self.groups.get_mut(name)
    }

    /// Returns the named group, inserting an empty one if absent.
    pub fn group_or_insert(&mut self, name: impl Into<String>) -> &mut NamelistGroup {
        self.groups.entry(name.into()).or_default()
    }

    /// Inserts a group; returns `false` (leaving the namelist untouched) if a
    /// group with this name already exists.
    pub fn insert_group(&mut self, name: impl Into<String>, group: NamelistGroup) -> bool {
        let name = name.into();
        if self.groups.contains_key(&name) {
            return false;
        }
        self.groups.insert(name, group);
        true
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NamelistGroup)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Lookup or patch of a namelist name outside the fixed JULES schema.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown namelist '{0}': not part of the JULES namelist schema")]
pub struct UnknownNamelist(pub String);

/// The complete, fixed-schema set of JULES namelists.
///
/// The key set is the closed list in [`ParameterSet::NAMES`] and is frozen at
/// construction: every name is always present (possibly as an empty
/// [`Namelist`]), and addressing any other name is an [`UnknownNamelist`]
/// error rather than an insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    namelists: IndexMap<String, Namelist>,
}

impl ParameterSet {
    /// Canonical JULES namelist file stems, one `<name>.nml` file each.
    pub const NAMES: [&'static str; 29] = [
        "ancillaries",
        "crop_params",
        "drive",
        "fire",
        "imogen",
        "initial_conditions",
        "jules_deposition",
        "jules_hydrology",
        "jules_irrig",
        "jules_prnt_control",
        "jules_radiation",
        "jules_rivers",
        "jules_snow",
        "jules_soil",
        "jules_soil_biogeochem",
        "jules_surface",
        "jules_surface_types",
        "jules_vegetation",
        "jules_water_resources",
        "model_environment",
        "model_grid",
        "nveg_params",
        "output",
        "pft_params",
        "prescribed_data",
        "science_fixes",
        "timesteps",
        "triffid_params",
        "urban",
    ];

    /// A parameter set with every namelist present and empty.
    pub fn empty() -> Self {
        Self {
            namelists: Self::NAMES
                .iter()
                .map(|name| (name.to_string(), Namelist::new()))
                .collect(),
        }
    }

    pub fn contains(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }

    pub fn namelist(&self, name: &str) -> Result<&Namelist, UnknownNamelist> {
        self.namelists
            .get(name)
            .ok_or_else(|| UnknownNamelist(name.to_string()))
    }

    pub fn namelist_mut(&mut self, name: &str) -> Result<&mut Namelist, UnknownNamelist> {
        self.namelists
            .get_mut(name)
            .ok_or_else(|| UnknownNamelist(name.to_string()))
    }

    /// Replaces the contents of one namelist. The name must be in the schema.
    pub fn set_namelist(&mut self, name: &str, namelist: Namelist) -> Result<(), UnknownNamelist> {
        *self.namelist_mut(name)? = namelist;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Namelist)> {
        self.namelists.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flattened view of every parameter as `(namelist, group, param, value)`.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str, &str, &Value)> {
        self.iter().flat_map(|(name, namelist)| {
            namelist.iter().flat_map(move |(group, g)| {
                g.iter().map(move |(param, value)| (name, group, param, value))
            })
        })
    }

    /// Shortcut to `output::jules_output::output_dir`, where JULES writes its
    /// model output.
    pub fn output_dir(&self) -> Option<&str> {
        self.namelists
            .get("output")?
            .group("jules_output")?
            .get("output_dir")?
            .as_str()
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_has_all_schema_names() {
        let params = ParameterSet::empty();
        let names: Vec<&str> = params.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ParameterSet::NAMES);
        assert!(params.iter().all(|(_, nml)| nml.is_empty()));
    }

    #[test]
    fn unknown_namelist_is_a_checked_error() {
        let mut params = ParameterSet::empty();
        assert!(params.namelist("drive").is_ok());
        assert_eq!(
            params.namelist_mut("jules_output"),
            Err(UnknownNamelist("jules_output".into()))
        );
        assert_eq!(
            params.set_namelist("extras", Namelist::new()),
            Err(UnknownNamelist("extras".into()))
        );
    }

    #[test]
    fn duplicate_group_insertion_is_rejected() {
        let mut nml = Namelist::new();
        assert!(nml.insert_group("jules_frac", NamelistGroup::new()));
        assert!(!nml.insert_group("jules_frac", NamelistGroup::new()));
        assert_eq!(nml.len(), 1);
    }

    #[test]
    fn parameters_flattens_in_declaration_order() {
        let mut params = ParameterSet::empty();
        let drive = params.namelist_mut("drive").unwrap();
        let group = drive.group_or_insert("jules_drive");
        group.set("file", "drive/data.txt");
        group.set("nvars", 3i64);

        let flat: Vec<_> = params.parameters().collect();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[0].0, "drive");
        assert_eq!(flat[0].1, "jules_drive");
        assert_eq!(flat[0].2, "file");
        assert_eq!(flat[1].2, "nvars");
    }

    #[test]
    fn output_dir_reads_the_conventional_location() {
        let mut params = ParameterSet::empty();
        assert_eq!(params.output_dir(), None);
        params
            .namelist_mut("output")
            .unwrap()
            .group_or_insert("jules_output")
            .set("output_dir", "output");
        assert_eq!(params.output_dir(), Some("output"));
    }
}
