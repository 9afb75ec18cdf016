use serde::Serialize;

use crate::models::content::SkillItem;

/// Bucket for skills without a category.
pub const DEFAULT_SKILL_CATEGORY: &str = "Other";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillGroup {
    pub category: String,
    pub skills: Vec<SkillItem>,
}

/// Groups skills by category for the templates.
///
/// Groups appear in first-seen category order and each group keeps the original
/// relative order of its skills. Missing or blank categories go to `"Other"`.
pub fn group_skills(skills: &[SkillItem]) -> Vec<SkillGroup> {
    let mut groups: Vec<SkillGroup> = Vec::new();

    for skill in skills {
        let category = skill
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_SKILL_CATEGORY);

        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.skills.push(skill.clone()),
            None => groups.push(SkillGroup {
                category: category.to_string(),
                skills: vec![skill.clone()],
            }),
        }
    }

    groups
}
