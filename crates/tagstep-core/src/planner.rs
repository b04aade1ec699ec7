use crate::stage::StageMap;
use crate::types::{AdvancementResult, Member};

/// Compute which members gain which tag and lose which tag.
///
/// Each tag a member holds that has a successor in `stages` contributes one
/// add (successor) and one remove (current tag). A member holding several
/// chain tags advances on every one of them; resolving that is left to
/// whoever maintains the tags upstream. Member ids keep presentation order.
pub fn plan(members: &[Member], stages: &StageMap) -> AdvancementResult {
    let mut result = AdvancementResult::default();
    for member in members {
        for tag in member.tag_names() {
            let Some(next) = stages.successor(tag) else {
                continue;
            };
            result
                .added
                .entry(next.to_string())
                .or_default()
                .push(member.id.clone());
            result
                .removed
                .entry(tag.to_string())
                .or_default()
                .push(member.id.clone());
        }
    }
    result
}
