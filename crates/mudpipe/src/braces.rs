//! 大括號深度掃描
//!
//! 樣式編譯、引數切分與變數/參數替換共用同一套 `{}` 巢狀規則：
//! 深度在 `{` 遞增、在 `}` 遞減，特殊字元（`$`、`%`、分隔符）只在深度 0 生效。

/// 逐字元走訪文字並附帶大括號深度
///
/// 對 `{` 回報遞增前的深度、對 `}` 回報遞減後的深度，
/// 因此最外層括號本身會以深度 0 回報，括號內的內容以深度 >= 1 回報。
/// 不成對的 `}` 不會讓深度變成負值。
pub fn depth_chars(text: &str) -> impl Iterator<Item = (usize, char, u32)> + '_ {
    let mut depth = 0u32;
    text.char_indices().map(move |(i, c)| match c {
        '{' => {
            let d = depth;
            depth += 1;
            (i, c, d)
        }
        '}' => {
            depth = depth.saturating_sub(1);
            (i, c, depth)
        }
        _ => (i, c, depth),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depths(text: &str) -> Vec<(char, u32)> {
        depth_chars(text).map(|(_, c, d)| (c, d)).collect()
    }

    #[test]
    fn test_flat_text() {
        assert_eq!(depths("ab"), vec![('a', 0), ('b', 0)]);
    }

    #[test]
    fn test_single_level() {
        assert_eq!(
            depths("a{b}c"),
            vec![('a', 0), ('{', 0), ('b', 1), ('}', 0), ('c', 0)]
        );
    }

    #[test]
    fn test_nested() {
        assert_eq!(
            depths("{a{b}}"),
            vec![('{', 0), ('a', 1), ('{', 1), ('b', 2), ('}', 1), ('}', 0)]
        );
    }

    #[test]
    fn test_unbalanced_close() {
        assert_eq!(depths("}a"), vec![('}', 0), ('a', 0)]);
    }
}
