use std::fmt;

use serde::Serialize;

use crate::time_entry::TimeEntry;

/// ブロックの色クラス。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorClass {
    Blue,
    Green,
    Purple,
    Orange,
    Pink,
    Teal,
    Yellow,
    Red,
}

/// 色クラスのパレット。並び順がハッシュ値との対応になる。
pub const PALETTE: [ColorClass; 8] = [
    ColorClass::Blue,
    ColorClass::Green,
    ColorClass::Purple,
    ColorClass::Orange,
    ColorClass::Pink,
    ColorClass::Teal,
    ColorClass::Yellow,
    ColorClass::Red,
];

impl ColorClass {
    /// CSSクラス名などに利用する名前を返す。
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorClass::Blue => "blue",
            ColorClass::Green => "green",
            ColorClass::Purple => "purple",
            ColorClass::Orange => "orange",
            ColorClass::Pink => "pink",
            ColorClass::Teal => "teal",
            ColorClass::Yellow => "yellow",
            ColorClass::Red => "red",
        }
    }
}

impl fmt::Display for ColorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 文字列のハッシュ値を計算する。
///
/// UTF-16のコード単位ごとに`hash = c + ((hash << 5) - hash)`を累積する。
/// 32bitに切り詰めるのはシフトの部分だけで、減算と加算は切り詰めない。
pub fn string_hash(key: &str) -> i64 {
    key.encode_utf16().fold(0i64, |hash, unit| {
        let shifted = (hash as i32).wrapping_shl(5) as i64;
        unit as i64 + (shifted - hash)
    })
}

/// キー文字列から色クラスを決める。
///
/// 異なる文字列が同じ色になることはある。
pub fn color_for_key(key: &str) -> ColorClass {
    let index = string_hash(key).unsigned_abs() as usize % PALETTE.len();
    PALETTE[index]
}

/// time entryの色クラスを決める。
///
/// descriptionが空の場合はidをキーとする。
pub fn color_class(entry: &TimeEntry) -> ColorClass {
    if entry.description.is_empty() {
        color_for_key(&entry.id.to_string())
    } else {
        color_for_key(&entry.description)
    }
}
