//! Imported library name -> redistributable bundle.

use std::collections::BTreeMap;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use portaxe_pe::BinaryProfile;
use regex::Regex;
use serde::Serialize;

/// A runtime package that can be staged next to an application.
#[derive(Debug)]
pub struct Redistributable {
    pub id:   &'static str,
    pub name: &'static str,
    patterns: &'static [&'static str],
}

pub static REDISTRIBUTABLES: &[Redistributable] = &[
    Redistributable {
        id:       "vcredist-2008",
        name:     "Microsoft Visual C++ 2008 Redistributable",
        patterns: &[r"^(msvcp90|msvcr90|msvcm90|vcomp90|mfc90u?|mfcm90u?)\.dll$"],
    },
    Redistributable {
        id:       "vcredist-2010",
        name:     "Microsoft Visual C++ 2010 Redistributable",
        patterns: &[r"^(msvcp100|msvcr100|vcomp100|mfc100u?|mfcm100u?)\.dll$"],
    },
    Redistributable {
        id:       "vcredist-2012",
        name:     "Microsoft Visual C++ 2012 Redistributable",
        patterns: &[r"^(msvcp110|msvcr110|vccorlib110|vcomp110|mfc110u?|mfcm110u?)\.dll$"],
    },
    Redistributable {
        id:       "vcredist-2013",
        name:     "Microsoft Visual C++ 2013 Redistributable",
        patterns: &[r"^(msvcp120|msvcr120|vccorlib120|vcomp120|mfc120u?|mfcm120u?)\.dll$"],
    },
    Redistributable {
        id:       "vcredist-2015-2022",
        name:     "Microsoft Visual C++ 2015-2022 Redistributable",
        patterns: &[
            r"^msvcp140(_1|_2|_atomic_wait|_codecvt_ids)?\.dll$",
            r"^(vcruntime140(_1)?|concrt140|vccorlib140|vcomp140)\.dll$",
            r"^(mfc140u?|mfcm140u?)\.dll$",
        ],
    },
    Redistributable {
        id:       "ucrt",
        name:     "Universal C Runtime",
        patterns: &[r"^ucrtbase\.dll$", r"^api-ms-win-crt-[a-z0-9-]+-l\d+-\d+-\d+\.dll$"],
    },
    Redistributable {
        id:       "directx-june2010",
        name:     "DirectX End-User Runtime (June 2010)",
        patterns: &[
            r"^d3dx9_\d+\.dll$",
            r"^d3dx10(_\d+)?\.dll$",
            r"^d3dx11_\d+\.dll$",
            r"^d3dcompiler_(3\d|4[0-3])\.dll$",
            r"^(xinput1_3|x3daudio1_7|xaudio2_7)\.dll$",
        ],
    },
];

static MATCHERS: Lazy<Vec<(Regex, &'static Redistributable)>> = Lazy::new(|| {
    REDISTRIBUTABLES
        .iter()
        .flat_map(|r| r.patterns.iter().map(move |p| (p, r)))
        .filter_map(|(p, r)| Regex::new(p).ok().map(|re| (re, r)))
        .collect()
});

/// The redistributable providing `library`, if any.
pub fn redistributable_for(library: &str) -> Option<&'static Redistributable> {
    let library = library.to_ascii_lowercase();
    MATCHERS
        .iter()
        .find(|(re, _)| re.is_match(&library))
        .map(|(_, r)| *r)
}

pub fn lookup(id: &str) -> Option<&'static Redistributable> {
    REDISTRIBUTABLES.iter().find(|r| r.id == id)
}

/// Which binary import caused a requirement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Reason {
    pub binary:  PathBuf,
    pub library: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DependencyRequirement {
    pub redistributable_id: &'static str,
    pub reason:             Reason,
}

/// Collapse every recognised import across `profiles` into one requirement per
/// redistributable, keeping the first reason seen. Unrecognised imports are ignored.
pub fn resolve<'a>(profiles: impl IntoIterator<Item = &'a BinaryProfile>) -> Vec<DependencyRequirement> {
    let mut required: BTreeMap<&'static str, DependencyRequirement> = BTreeMap::new();
    for profile in profiles {
        for library in &profile.imported_libraries {
            let Some(redist) = redistributable_for(library) else {
                continue;
            };
            required.entry(redist.id).or_insert_with(|| {
                tracing::debug!(
                    redistributable = redist.id,
                    binary = %profile.path.display(),
                    library = %library,
                    "dependency required"
                );
                DependencyRequirement {
                    redistributable_id: redist.id,
                    reason:             Reason {
                        binary:  profile.path.clone(),
                        library: library.clone(),
                    },
                }
            });
        }
    }
    required.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use portaxe_pe::fixture::PeBuilder;
    use portaxe_pe::inspect_bytes;

    fn profile(path: &str, imports: &[&str]) -> BinaryProfile {
        let image = imports
            .iter()
            .fold(PeBuilder::x64(), |b, i| b.import(*i))
            .build();
        inspect_bytes(path, &image).unwrap()
    }

    #[test]
    fn every_pattern_compiles() {
        let total: usize = REDISTRIBUTABLES.iter().map(|r| r.patterns.len()).sum();
        assert_eq!(MATCHERS.len(), total);
    }

    #[test]
    fn known_runtime_libraries() {
        let cases = [
            ("MSVCP140.dll", "vcredist-2015-2022"),
            ("vcruntime140_1.dll", "vcredist-2015-2022"),
            ("mfc140u.dll", "vcredist-2015-2022"),
            ("msvcr120.dll", "vcredist-2013"),
            ("msvcp110.dll", "vcredist-2012"),
            ("msvcr100.dll", "vcredist-2010"),
            ("msvcr90.dll", "vcredist-2008"),
            ("ucrtbase.dll", "ucrt"),
            ("api-ms-win-crt-runtime-l1-1-0.dll", "ucrt"),
            ("d3dx9_43.dll", "directx-june2010"),
            ("XINPUT1_3.dll", "directx-june2010"),
        ];
        for (library, id) in cases {
            assert_eq!(redistributable_for(library).map(|r| r.id), Some(id), "{library}");
        }
    }

    #[test]
    fn system_libraries_are_ignored() {
        for library in ["kernel32.dll", "user32.dll", "msvcrt.dll", "xinput1_4.dll", "msvcp140.dll.bak"] {
            assert!(redistributable_for(library).is_none(), "{library}");
        }
    }

    #[test]
    fn duplicates_collapse_keeping_first_reason() {
        let a = profile("a.exe", &["msvcp140.dll", "kernel32.dll"]);
        let b = profile("b.dll", &["vcruntime140.dll", "msvcp140.dll"]);

        let required = resolve([&a, &b]);

        assert_eq!(required.len(), 1);
        assert_eq!(required[0].redistributable_id, "vcredist-2015-2022");
        assert_eq!(required[0].reason.binary, PathBuf::from("a.exe"));
        assert_eq!(required[0].reason.library, "msvcp140.dll");
    }

    #[test]
    fn distinct_redistributables_are_kept() {
        let a = profile("game.exe", &["d3dx9_43.dll", "msvcr100.dll"]);
        let ids: Vec<_> = resolve([&a]).into_iter().map(|r| r.redistributable_id).collect();
        assert_eq!(ids, ["directx-june2010", "vcredist-2010"]);
    }

    #[test]
    fn damaged_binary_is_dependency_inert() {
        let image = PeBuilder::x64().import("msvcp140.dll").build();
        let damaged = inspect_bytes("cut.dll", &image[..0x170]).unwrap();
        assert!(damaged.malformed);
        assert!(resolve([&damaged]).is_empty());
    }

    #[test]
    fn no_profiles_no_requirements() {
        assert!(resolve(std::iter::empty::<&BinaryProfile>()).is_empty());
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(lookup("ucrt").map(|r| r.name), Some("Universal C Runtime"));
        assert!(lookup("nope").is_none());
    }
}
