//! キーポイント分類表
//!
//! 33ランドマークのラベル・左右・グループ所属を起動時に一度だけ構築する。
//! ラベルが左右/顔のいずれにも分類できない場合は構築時にエラーとする。

use std::fmt;

use crate::error::ConfigError;
use crate::pose::keypoint::KeypointIndex;

/// 体のどちら側か
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Center,
}

/// まとめて切り替えるランドマークのグループ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupId {
    Face,
    LeftHand,
    RightHand,
    LeftFoot,
    RightFoot,
}

impl GroupId {
    pub const COUNT: usize = 5;

    pub const ALL: [GroupId; Self::COUNT] = [
        Self::Face,
        Self::LeftHand,
        Self::RightHand,
        Self::LeftFoot,
        Self::RightFoot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Face => "face",
            Self::LeftHand => "left-hand",
            Self::RightHand => "right-hand",
            Self::LeftFoot => "left-foot",
            Self::RightFoot => "right-foot",
        }
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 分類表の1行: (ラベル, 個別に切り替え可能か)
pub type KeypointEntry = (&'static str, bool);

/// BlazePose のラベル表
///
/// 顔の細部（目・耳・口）と指は個別に切り替えない。
pub const BLAZEPOSE_KEYPOINTS: [KeypointEntry; KeypointIndex::COUNT] = [
    ("face", true),
    ("left eye (inner)", false),
    ("left eye", false),
    ("left eye (outer)", false),
    ("right eye (inner)", false),
    ("right eye", false),
    ("right eye (outer)", false),
    ("left ear", false),
    ("right ear", false),
    ("mouth (left)", false),
    ("mouth (right)", false),
    ("left shoulder", true),
    ("right shoulder", true),
    ("left elbow", true),
    ("right elbow", true),
    ("left wrist", true),
    ("right wrist", true),
    ("left pinky", false),
    ("right pinky", false),
    ("left index finger", false),
    ("right index finger", false),
    ("left thumb", false),
    ("right thumb", false),
    ("left hip", true),
    ("right hip", true),
    ("left knee", true),
    ("right knee", true),
    ("left ankle", true),
    ("right ankle", true),
    ("left heel", true),
    ("right heel", true),
    ("left toe", true),
    ("right toe", true),
];

/// グループ定義
pub const BLAZEPOSE_GROUPS: [(GroupId, &[usize]); GroupId::COUNT] = [
    (GroupId::Face, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10]),
    (GroupId::LeftHand, &[15, 17, 19, 21]),
    (GroupId::RightHand, &[16, 18, 20, 22]),
    (GroupId::LeftFoot, &[27, 29, 31]),
    (GroupId::RightFoot, &[28, 30, 32]),
];

/// 分類済みキーポイント
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointInfo {
    pub index: usize,
    pub label: &'static str,
    pub side: Side,
    pub interactive: bool,
    pub groups: Vec<GroupId>,
}

/// ラベルから左右を判定する
pub fn classify_side(label: &str) -> Option<Side> {
    let lower = label.to_ascii_lowercase();
    if lower.contains("left") {
        Some(Side::Left)
    } else if lower.contains("right") {
        Some(Side::Right)
    } else if lower.contains("face") {
        Some(Side::Center)
    } else {
        None
    }
}

/// 起動後は変更されないキーポイント分類表
#[derive(Debug, Clone)]
pub struct Taxonomy {
    keypoints: Vec<KeypointInfo>,
    members: [Vec<usize>; GroupId::COUNT],
}

impl Taxonomy {
    /// 標準の BlazePose 分類表
    pub fn blazepose() -> Result<Self, ConfigError> {
        Self::from_entries(&BLAZEPOSE_KEYPOINTS, &BLAZEPOSE_GROUPS)
    }

    /// ラベル表とグループ表から構築し、全エントリを即時検証する
    pub fn from_entries(
        entries: &[KeypointEntry],
        groups: &[(GroupId, &[usize])],
    ) -> Result<Self, ConfigError> {
        if entries.len() != KeypointIndex::COUNT {
            return Err(ConfigError::KeypointCount {
                expected: KeypointIndex::COUNT,
                actual: entries.len(),
            });
        }

        let mut keypoints = Vec::with_capacity(entries.len());
        for (index, &(label, interactive)) in entries.iter().enumerate() {
            let side = classify_side(label).ok_or_else(|| ConfigError::UnclassifiedLabel {
                index,
                label: label.to_string(),
            })?;
            keypoints.push(KeypointInfo {
                index,
                label,
                side,
                interactive,
                groups: Vec::new(),
            });
        }

        let mut members: [Vec<usize>; GroupId::COUNT] = Default::default();
        for &(group, indices) in groups {
            for &index in indices {
                let info = keypoints.get_mut(index).ok_or(ConfigError::GroupIndexOutOfRange {
                    group,
                    index,
                    len: entries.len(),
                })?;
                if !info.groups.contains(&group) {
                    info.groups.push(group);
                }
                if !members[group as usize].contains(&index) {
                    members[group as usize].push(index);
                }
            }
        }

        Ok(Self { keypoints, members })
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&KeypointInfo> {
        self.keypoints.get(index)
    }

    pub fn keypoints(&self) -> &[KeypointInfo] {
        &self.keypoints
    }

    pub fn label(&self, index: usize) -> Option<&'static str> {
        self.get(index).map(|k| k.label)
    }

    pub fn is_interactive(&self, index: usize) -> bool {
        self.get(index).is_some_and(|k| k.interactive)
    }

    /// キーポイントが属するグループ
    pub fn groups_of(&self, index: usize) -> &[GroupId] {
        self.get(index).map(|k| k.groups.as_slice()).unwrap_or(&[])
    }

    /// グループのメンバー
    pub fn members(&self, group: GroupId) -> &[usize] {
        &self.members[group as usize]
    }

    /// 個別に切り替え可能なキーポイント（インデックス順）
    pub fn interactive_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.keypoints
            .iter()
            .filter(|k| k.interactive)
            .map(|k| k.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blazepose_taxonomy_builds() {
        let taxonomy = Taxonomy::blazepose().unwrap();
        assert_eq!(taxonomy.len(), 33);
        assert_eq!(taxonomy.label(0), Some("face"));
        assert_eq!(taxonomy.get(0).unwrap().side, Side::Center);
        assert_eq!(taxonomy.get(15).unwrap().side, Side::Left);
        assert_eq!(taxonomy.get(16).unwrap().side, Side::Right);
    }

    #[test]
    fn test_group_members() {
        let taxonomy = Taxonomy::blazepose().unwrap();
        assert_eq!(taxonomy.members(GroupId::RightHand), &[16, 18, 20, 22]);
        assert_eq!(taxonomy.members(GroupId::LeftHand), &[15, 17, 19, 21]);
        assert_eq!(taxonomy.members(GroupId::Face).len(), 11);
        assert_eq!(taxonomy.members(GroupId::LeftFoot), &[27, 29, 31]);
        assert_eq!(taxonomy.members(GroupId::RightFoot), &[28, 30, 32]);
    }

    #[test]
    fn test_groups_of() {
        let taxonomy = Taxonomy::blazepose().unwrap();
        assert_eq!(taxonomy.groups_of(16), &[GroupId::RightHand]);
        assert_eq!(taxonomy.groups_of(0), &[GroupId::Face]);
        assert!(taxonomy.groups_of(11).is_empty());
        assert!(taxonomy.groups_of(99).is_empty());
    }

    #[test]
    fn test_interactive_indices() {
        let taxonomy = Taxonomy::blazepose().unwrap();
        let interactive: Vec<usize> = taxonomy.interactive_indices().collect();
        let mut expected = vec![0, 11, 12, 13, 14, 15, 16];
        expected.extend(23..33);
        assert_eq!(interactive, expected);

        // 顔の細部と指は非対話
        for i in (1..=10).chain(17..=22) {
            assert!(!taxonomy.is_interactive(i), "index {} should be non-interactive", i);
        }
    }

    #[test]
    fn test_classify_side() {
        assert_eq!(classify_side("left knee"), Some(Side::Left));
        assert_eq!(classify_side("Right Heel"), Some(Side::Right));
        assert_eq!(classify_side("face"), Some(Side::Center));
        assert_eq!(classify_side("nose"), None);
    }

    #[test]
    fn test_unclassified_label_is_rejected() {
        let mut entries = BLAZEPOSE_KEYPOINTS;
        entries[0] = ("nose", true);

        let err = Taxonomy::from_entries(&entries, &BLAZEPOSE_GROUPS).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnclassifiedLabel {
                index: 0,
                label: "nose".to_string()
            }
        );
    }

    #[test]
    fn test_group_index_out_of_range() {
        let groups: [(GroupId, &[usize]); 1] = [(GroupId::RightHand, &[16, 40])];
        let err = Taxonomy::from_entries(&BLAZEPOSE_KEYPOINTS, &groups).unwrap_err();
        assert_eq!(
            err,
            ConfigError::GroupIndexOutOfRange {
                group: GroupId::RightHand,
                index: 40,
                len: 33
            }
        );
    }

    #[test]
    fn test_wrong_keypoint_count() {
        let err =
            Taxonomy::from_entries(&BLAZEPOSE_KEYPOINTS[..17], &BLAZEPOSE_GROUPS).unwrap_err();
        assert_eq!(
            err,
            ConfigError::KeypointCount {
                expected: 33,
                actual: 17
            }
        );
    }
}
