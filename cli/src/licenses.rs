/// Value accepted in place of an SPDX identifier when the project is unlicensed.
pub const NO_LICENSE: &str = "None";

/// SPDX license identifiers we accept.
/// Not the whole SPDX list, but every license anyone has picked for a starter project.
pub const SPDX_IDS: &[&str] = &[
    "0BSD",
    "AAL",
    "AFL-1.1",
    "AFL-1.2",
    "AFL-2.0",
    "AFL-2.1",
    "AFL-3.0",
    "AGPL-1.0-only",
    "AGPL-1.0-or-later",
    "AGPL-3.0-only",
    "AGPL-3.0-or-later",
    "APL-1.0",
    "APSL-2.0",
    "Apache-1.0",
    "Apache-1.1",
    "Apache-2.0",
    "Artistic-1.0",
    "Artistic-2.0",
    "BSD-1-Clause",
    "BSD-2-Clause",
    "BSD-2-Clause-Patent",
    "BSD-3-Clause",
    "BSD-3-Clause-Clear",
    "BSD-4-Clause",
    "BSL-1.0",
    "BlueOak-1.0.0",
    "CAL-1.0",
    "CC-BY-3.0",
    "CC-BY-4.0",
    "CC-BY-SA-3.0",
    "CC-BY-SA-4.0",
    "CC-BY-NC-4.0",
    "CC-BY-NC-SA-4.0",
    "CC-BY-ND-4.0",
    "CC0-1.0",
    "CDDL-1.0",
    "CDDL-1.1",
    "CECILL-2.1",
    "CPAL-1.0",
    "CPL-1.0",
    "ECL-2.0",
    "EFL-2.0",
    "EPL-1.0",
    "EPL-2.0",
    "EUPL-1.1",
    "EUPL-1.2",
    "GPL-1.0-only",
    "GPL-1.0-or-later",
    "GPL-2.0-only",
    "GPL-2.0-or-later",
    "GPL-3.0-only",
    "GPL-3.0-or-later",
    "HPND",
    "ISC",
    "LGPL-2.0-only",
    "LGPL-2.0-or-later",
    "LGPL-2.1-only",
    "LGPL-2.1-or-later",
    "LGPL-3.0-only",
    "LGPL-3.0-or-later",
    "LPPL-1.3c",
    "MIT",
    "MIT-0",
    "MPL-1.1",
    "MPL-2.0",
    "MPL-2.0-no-copyleft-exception",
    "MS-PL",
    "MS-RL",
    "MulanPSL-2.0",
    "NCSA",
    "ODbL-1.0",
    "OFL-1.1",
    "OSL-3.0",
    "PHP-3.01",
    "PostgreSQL",
    "Python-2.0",
    "QPL-1.0",
    "RPL-1.5",
    "Ruby",
    "SSPL-1.0",
    "Unicode-DFS-2016",
    "Unlicense",
    "UPL-1.0",
    "Vim",
    "W3C",
    "WTFPL",
    "X11",
    "Zlib",
    "ZPL-2.1",
];

/// Resolves user input to the canonical spelling of an SPDX identifier.
///
/// SPDX ids match case-insensitively, so "mit" comes back as "MIT".
/// The literal "None" (any case) is accepted too. Anything else is `None`.
pub fn canonical(input: &str) -> Option<&'static str> {
    let input = input.trim();
    if input.eq_ignore_ascii_case(NO_LICENSE) {
        return Some(NO_LICENSE);
    }
    SPDX_IDS
        .iter()
        .copied()
        .find(|id| id.eq_ignore_ascii_case(input))
}

/// Choices offered by the interactive license picker, most common first.
pub fn prompt_choices() -> Vec<&'static str> {
    let popular = [
        "MIT",
        "Apache-2.0",
        "ISC",
        "BSD-3-Clause",
        "GPL-3.0-only",
        "MPL-2.0",
        "Unlicense",
    ];
    let mut choices: Vec<&'static str> = popular.to_vec();
    choices.push(NO_LICENSE);
    choices.extend(SPDX_IDS.iter().copied().filter(|id| !popular.contains(id)));
    choices
}
