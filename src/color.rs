// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use colored::Color;
use colored::ColoredString;
use colored::Colorize as _;

use crate::layout::Colorize;

/// Colors for the conventional level names.
///
/// Levels not listed here are left undecorated.
#[derive(Debug, Clone)]
pub struct LevelColor {
    /// Color for `error`.
    pub error: Color,
    /// Color for `warn`.
    pub warn: Color,
    /// Color for `info`.
    pub info: Color,
    /// Color for `verbose`.
    pub verbose: Color,
    /// Color for `debug`.
    pub debug: Color,
    /// Color for `silly` and `trace`.
    pub trace: Color,
}

impl Default for LevelColor {
    fn default() -> Self {
        Self {
            error: Color::Red,
            warn: Color::Yellow,
            info: Color::Green,
            verbose: Color::Cyan,
            debug: Color::Blue,
            trace: Color::Magenta,
        }
    }
}

impl LevelColor {
    /// Colorize the level name.
    pub fn colorize_level(&self, level: &str) -> ColoredString {
        let color = match level {
            "error" => self.error,
            "warn" => self.warn,
            "info" => self.info,
            "verbose" => self.verbose,
            "debug" => self.debug,
            "silly" | "trace" => self.trace,
            _ => return ColoredString::from(level),
        };
        ColoredString::from(level).color(color)
    }
}

impl From<LevelColor> for Colorize {
    fn from(colors: LevelColor) -> Self {
        Colorize::new(move |level| colors.colorize_level(level).to_string())
    }
}
