use crate::model::Rgb;

/// これ以上のインデックスを降水とみなす
pub const FIRST_RAIN_CATEGORY: usize = 2;

/// 気象庁高解像度降水ナウキャストの凡例色 (RGB、アルファ除去後)
pub const JMA_NOWCAST_COLORS: [Rgb; 10] = [
    Rgb(0, 0, 0),       // データなし (透明)
    Rgb(255, 255, 255), // 降水なし
    Rgb(242, 242, 255), // 1 mm/h 未満
    Rgb(160, 210, 255), // 1 - 5 mm/h
    Rgb(33, 140, 255),  // 5 - 10 mm/h
    Rgb(0, 65, 255),    // 10 - 20 mm/h
    Rgb(255, 246, 0),   // 20 - 30 mm/h
    Rgb(255, 154, 0),   // 30 - 50 mm/h
    Rgb(255, 40, 0),    // 50 - 80 mm/h
    Rgb(180, 0, 104),   // 80 mm/h 以上
];

/// 色からカテゴリを引く表。先に一致したものが優先される
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(JMA_NOWCAST_COLORS.to_vec())
    }
}

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Self {
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn color(&self, category: usize) -> Option<Rgb> {
        self.colors.get(category).copied()
    }

    /// 完全一致でカテゴリを判定する。どれにも一致しなければ `None`
    pub fn classify(&self, rgb: Rgb) -> Option<usize> {
        self.colors.iter().position(|&c| c == rgb)
    }

    pub fn is_rain(category: usize) -> bool {
        category >= FIRST_RAIN_CATEGORY
    }
}
