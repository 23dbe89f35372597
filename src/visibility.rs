//! キーポイントごとの表示フラグ
//!
//! UIイベントからのみ変更される。描画ループと同じスレッドで扱うのでロックは持たない。

use crate::error::ConfigError;
use crate::pose::taxonomy::{GroupId, Taxonomy};

#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityState {
    flags: Vec<bool>,
    interactive: Vec<bool>,
    labels: Vec<&'static str>,
    members: [Vec<usize>; GroupId::COUNT],
}

impl VisibilityState {
    /// 全フラグ OFF で作成
    pub fn new(taxonomy: &Taxonomy) -> Self {
        let keypoints = taxonomy.keypoints();
        Self {
            flags: vec![false; keypoints.len()],
            interactive: keypoints.iter().map(|k| k.interactive).collect(),
            labels: keypoints.iter().map(|k| k.label).collect(),
            members: GroupId::ALL.map(|g| taxonomy.members(g).to_vec()),
        }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    fn check_interactive(&self, index: usize) -> Result<(), ConfigError> {
        match self.interactive.get(index) {
            None => Err(ConfigError::IndexOutOfRange {
                index,
                len: self.flags.len(),
            }),
            Some(false) => Err(ConfigError::NonInteractive {
                index,
                label: self.labels[index].to_string(),
            }),
            Some(true) => Ok(()),
        }
    }

    /// 1つだけ設定する。非対話キーポイントはエラー
    pub fn set_single(&mut self, index: usize, value: bool) -> Result<(), ConfigError> {
        self.check_interactive(index)?;
        self.flags[index] = value;
        Ok(())
    }

    /// グループの全メンバーを設定する
    ///
    /// `&mut self` を取るので、呼び出し側からは途中状態が見えない。
    pub fn set_group(&mut self, group: GroupId, value: bool) {
        for &index in &self.members[group as usize] {
            self.flags[index] = value;
        }
    }

    /// 対話キーポイントを一括設定し、非対話キーポイントは常に OFF に戻す
    pub fn select_all(&mut self, value: bool) {
        for (flag, &interactive) in self.flags.iter_mut().zip(&self.interactive) {
            *flag = interactive && value;
        }
    }

    /// 範囲外は false
    pub fn is_visible(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    /// グループ内に表示中のメンバーが1つでもあるか
    pub fn any_visible(&self, group: GroupId) -> bool {
        self.members[group as usize].iter().any(|&i| self.flags[i])
    }

    /// 対話キーポイントが全て表示中か
    pub fn all_selected(&self) -> bool {
        self.flags
            .iter()
            .zip(&self.interactive)
            .filter(|(_, interactive)| **interactive)
            .all(|(flag, _)| *flag)
    }

    pub fn visible_count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    /// 反転して新しい値を返す
    pub fn toggle_single(&mut self, index: usize) -> Result<bool, ConfigError> {
        self.check_interactive(index)?;
        let value = !self.flags[index];
        self.flags[index] = value;
        Ok(value)
    }

    /// 1つでも表示中なら全 OFF、そうでなければ全 ON
    pub fn toggle_group(&mut self, group: GroupId) -> bool {
        let value = !self.any_visible(group);
        self.set_group(group, value);
        value
    }

    /// 全選択済みなら全解除、そうでなければ全選択
    pub fn toggle_all(&mut self) -> bool {
        let value = !self.all_selected();
        self.select_all(value);
        value
    }
}
