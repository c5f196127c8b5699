//! ロードバランサーモジュール
//!
//! モデルごとの候補エンドポイントから1件を選ぶ。
//!
//! # 選択アルゴリズム
//!
//! - 候補が1件ならそのまま返す（乱数もカウンタも使わない）
//! - 設定された重みの合計が 0（全候補が `weight <= 0`）ならモデル単位の
//!   カウンタで厳密なラウンドロビン
//! - それ以外は重み付きランダム選択（`weight <= 0` の候補は重み 1）
//!
//! 重み付き選択は呼び出しごとに独立した抽選で、回転スケジュールは持たない。
//! カウンタと乱数生成器は1つのMutexで保護する。

use crate::types::EndpointDescriptor;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// モデル単位のエンドポイント選択器
pub struct Balancer {
    state: Mutex<BalancerState>,
}

struct BalancerState {
    /// モデル名 → ラウンドロビンカウンタ
    counters: HashMap<String, u64>,
    rng: StdRng,
}

impl Balancer {
    /// OS乱数でシードした乱数生成器を持つバランサーを作成
    pub fn new() -> Self {
        Self::with_rng(StdRng::seed_from_u64(rand::random()))
    }

    /// 固定シードのバランサーを作成（分布テスト用）
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    /// 乱数生成器を指定してバランサーを作成
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            state: Mutex::new(BalancerState {
                counters: HashMap::new(),
                rng,
            }),
        }
    }

    /// 候補から1件選択する
    ///
    /// 候補が空なら `None`。空でなければ必ず候補のいずれかを返す。
    pub fn select<'a>(
        &self,
        model: &str,
        candidates: &'a [Arc<EndpointDescriptor>],
    ) -> Option<&'a Arc<EndpointDescriptor>> {
        match candidates.len() {
            0 => return None,
            1 => return candidates.first(),
            _ => {}
        }

        // i64::MAX を複数足しても溢れないよう u128 で合計する
        let configured_total: u128 = candidates
            .iter()
            .map(|e| u128::from(e.configured_weight()))
            .sum();
        if configured_total == 0 {
            return Some(self.select_round_robin(model, candidates));
        }

        let total: u128 = candidates
            .iter()
            .map(|e| u128::from(e.effective_weight()))
            .sum();
        let mut remaining = self.lock().rng.random_range(0..total);
        for endpoint in candidates {
            let weight = u128::from(endpoint.effective_weight());
            if remaining < weight {
                return Some(endpoint);
            }
            remaining -= weight;
        }

        candidates.last()
    }

    /// モデル単位のカウンタで候補を順番に選ぶ
    fn select_round_robin<'a>(
        &self,
        model: &str,
        candidates: &'a [Arc<EndpointDescriptor>],
    ) -> &'a Arc<EndpointDescriptor> {
        let cursor = {
            let mut state = self.lock();
            let counter = state.counters.entry(model.to_string()).or_insert(0);
            let cursor = *counter;
            *counter = counter.wrapping_add(1);
            cursor
        };
        let index = (cursor % candidates.len() as u64) as usize;
        &candidates[index]
    }

    /// モデルのラウンドロビンカウンタの現在値（未使用なら 0）
    pub fn counter(&self, model: &str) -> u64 {
        self.lock().counters.get(model).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, BalancerState> {
        // ロック中にpanicしても状態は常に整合している
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for Balancer {
    fn default() -> Self {
        Self::new()
    }
}
