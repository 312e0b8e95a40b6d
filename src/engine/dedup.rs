// ==========================================
// 工程项目管理系统 - 联系人去重守卫
// ==========================================
// 职责: 写入前按组织内邮箱过滤已存在的联系人（静默跳过,不报错）
// 红线: 仅联系人导入走去重;邮箱为空的行永远放行;
//       比对统一小写,且只看未软删除的既有记录
// ==========================================

use crate::domain::record::ResolvedContact;
use crate::repository::reference_repo::ReferenceRepository;
use std::collections::HashSet;
use std::error::Error;
use tracing::debug;

/// 过滤组织内已存在邮箱的联系人
///
/// # 返回
/// - (保留记录, 跳过数): 跳过数计入批次结果的 skipped,不产出行错误
///
/// # 说明
/// - 只对既有库内记录去重,同批次内的重复邮箱各自落库
///   （与宽容导入口径一致,批内冲突交给后续人工清理）
pub async fn filter_existing_contacts<R>(
    repo: &R,
    organization_id: &str,
    records: Vec<ResolvedContact>,
) -> Result<(Vec<ResolvedContact>, usize), Box<dyn Error>>
where
    R: ReferenceRepository + ?Sized,
{
    let emails: Vec<String> = records
        .iter()
        .filter_map(|r| r.email.clone())
        .filter(|e| !e.is_empty())
        .collect();

    if emails.is_empty() {
        return Ok((records, 0));
    }

    let existing: HashSet<String> = repo
        .existing_contact_emails(organization_id, &emails)
        .await?
        .into_iter()
        .collect();

    let total = records.len();
    let kept: Vec<ResolvedContact> = records
        .into_iter()
        .filter(|r| match &r.email {
            Some(email) if !email.is_empty() => !existing.contains(email),
            _ => true,
        })
        .collect();
    let skipped = total - kept.len();

    debug!(
        organization_id,
        total, skipped, "联系人邮箱去重完成"
    );

    Ok((kept, skipped))
}
