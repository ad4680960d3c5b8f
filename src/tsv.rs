use crate::error::PrepResult;
use crate::types::RawRow;
use std::io::Read;
use std::path::Path;

/// 書き起こし表（タブ区切り）の読み込み
///
/// 先頭行はヘッダとして読み飛ばし、残りの行を列の並びとして返す。
/// 書き起こしテキストに `"` が含まれても列が崩れないよう、
/// クォート処理は行わない。行ごとの列数の違いは許容し、
/// 列数の検証はデコード時にレイアウトに対して行う。
pub fn read_rows<R: Read>(reader: R) -> PrepResult<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// 書き起こし表ファイルを読み込む
pub fn read_file<P: AsRef<Path>>(path: P) -> PrepResult<Vec<RawRow>> {
    let file = std::fs::File::open(path.as_ref())?;
    let rows = read_rows(std::io::BufReader::new(file))?;
    log::debug!("書き起こし表を読み込み: {:?} ({} 行)", path.as_ref(), rows.len());
    Ok(rows)
}
