//! Group tree of a Hagenbach-Bischoff run: `Root → ListUnion → SubListUnion → List`.
//!
//! Nodes live in an arena and refer to each other by `GroupId`; parent and
//! children links are written together when a node is inserted.

use std::collections::BTreeMap;

use am_core::ids::{ListId, ListUnionId};
use am_core::rounding::Ratio;
use serde::{Deserialize, Serialize};

use super::HagenbachBischoffError;

/// Index of a group in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub usize);

/// Stable identity of a group across reruns (arena indices are not).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum GroupKey {
    Root,
    ListUnion(ListUnionId),
    SubListUnion(ListUnionId),
    List(ListId),
}

/// One list as handed in by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HagenbachBischoffList {
    pub list_id: ListId,
    pub vote_count: u64,
    #[serde(default)]
    pub list_union: Option<ListUnionId>,
    #[serde(default)]
    pub sub_list_union: Option<ListUnionId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerReason {
    /// Strictly highest quotient, or a tie every member of which gets a seat.
    Quotient,
    LotDecision,
}

/// Per-sibling values of one calculation round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupValues {
    pub group: GroupKey,
    pub previous_quotient: Ratio,
    pub next_quotient: Ratio,
    pub previous_number_of_mandates: u32,
    pub number_of_mandates: u32,
    pub is_winner: bool,
}

/// One seat awarded after the initial distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationRound {
    /// 1-based within the parent group.
    pub index: u32,
    pub winner: GroupKey,
    pub winner_reason: WinnerReason,
    pub group_values: Vec<GroupValues>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub key: GroupKey,
    pub parent: Option<GroupId>,
    pub children: Vec<GroupId>,
    pub vote_count: u64,
    pub initial_number_of_mandates: u32,
    pub number_of_mandates: u32,
    /// `vote_count / (number_of_mandates + 1)`.
    pub quotient: Ratio,
    /// `⌊quotient⌋ + 1`.
    pub distribution_number: u64,
    /// Rounds among this group's children.
    pub calculation_rounds: Vec<CalculationRound>,
}

impl Group {
    fn new(id: GroupId, key: GroupKey, parent: Option<GroupId>) -> Self {
        Self {
            id,
            key,
            parent,
            children: Vec::new(),
            vote_count: 0,
            initial_number_of_mandates: 0,
            number_of_mandates: 0,
            quotient: Ratio::ZERO,
            distribution_number: 0,
            calculation_rounds: Vec::new(),
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty() && matches!(self.key, GroupKey::List(_))
    }
}

/// Arena-backed tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupTree {
    groups: Vec<Group>,
    #[serde(skip)]
    index: BTreeMap<GroupKey, GroupId>,
}

impl GroupTree {
    pub const ROOT: GroupId = GroupId(0);

    /// Build the tree from lists in input order; children keep first-appearance order.
    pub fn build(lists: &[HagenbachBischoffList]) -> Result<Self, HagenbachBischoffError> {
        let mut tree = GroupTree { groups: Vec::new(), index: BTreeMap::new() };
        tree.insert(GroupKey::Root, None);

        for list in lists {
            let leaf_key = GroupKey::List(list.list_id.clone());
            if tree.index.contains_key(&leaf_key) {
                return Err(HagenbachBischoffError::DuplicateList(list.list_id.clone()));
            }

            let mut parent = Self::ROOT;
            match (&list.list_union, &list.sub_list_union) {
                (None, Some(_)) => {
                    return Err(HagenbachBischoffError::SubListUnionWithoutUnion(list.list_id.clone()));
                }
                (None, None) => {}
                (Some(union), sub) => {
                    parent = tree.get_or_insert(GroupKey::ListUnion(union.clone()), parent)?;
                    if let Some(sub) = sub {
                        parent = tree.get_or_insert(GroupKey::SubListUnion(sub.clone()), parent)?;
                    }
                }
            }

            let leaf = tree.insert(leaf_key, Some(parent));
            let mut cursor = Some(leaf);
            while let Some(id) = cursor {
                let g = &mut tree.groups[id.0];
                g.vote_count += list.vote_count;
                cursor = g.parent;
            }
        }
        Ok(tree)
    }

    fn insert(&mut self, key: GroupKey, parent: Option<GroupId>) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(Group::new(id, key.clone(), parent));
        if let Some(p) = parent {
            self.groups[p.0].children.push(id);
        }
        self.index.insert(key, id);
        id
    }

    fn get_or_insert(&mut self, key: GroupKey, parent: GroupId) -> Result<GroupId, HagenbachBischoffError> {
        match self.index.get(&key) {
            Some(&id) if self.groups[id.0].parent == Some(parent) => Ok(id),
            Some(_) => match key {
                GroupKey::SubListUnion(sub) => Err(HagenbachBischoffError::SubListUnionInMultipleUnions(sub)),
                other => Err(HagenbachBischoffError::MisplacedGroup(other)),
            },
            None => Ok(self.insert(key, Some(parent))),
        }
    }

    #[inline]
    pub fn root(&self) -> &Group {
        &self.groups[Self::ROOT.0]
    }

    #[inline]
    pub fn get(&self, id: GroupId) -> &Group {
        &self.groups[id.0]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: GroupId) -> &mut Group {
        &mut self.groups[id.0]
    }

    pub fn by_key(&self, key: &GroupKey) -> Option<&Group> {
        self.index.get(key).map(|id| &self.groups[id.0])
    }

    /// All groups in insertion order (root first).
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// List leaves in input order.
    pub fn lists(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter().filter(|g| g.is_leaf())
    }
}
