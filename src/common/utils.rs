/// 文件名允许的最大长度（字符数）
const MAX_FILENAME_LEN: usize = 200;

/// 清理文件名中Windows不允许的字符，截断到200字符
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();

    cleaned.trim().chars().take(MAX_FILENAME_LEN).collect()
}

/// 解析课程选择输入，如 "all" 或 "1,3,5"，返回0起始的下标
pub fn parse_selection(input: &str, count: usize) -> Result<Vec<usize>, String> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") {
        return Ok((0..count).collect());
    }

    let mut selected = Vec::new();
    for part in input.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let idx: usize = part
            .parse()
            .map_err(|_| format!("无法识别的序号: {}", part))?;
        if idx < 1 || idx > count {
            return Err(format!("序号 {} 超出范围 (1-{})", idx, count));
        }
        if !selected.contains(&(idx - 1)) {
            selected.push(idx - 1);
        }
    }

    if selected.is_empty() {
        return Err("未选择任何课程".to_string());
    }
    Ok(selected)
}
