// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use redis::AsyncCommands;

/// Redis客户端
///
/// 提供限流窗口（有序集合）与进度日志（列表）所需的异步操作
#[derive(Clone)]
pub struct RedisClient {
    /// Redis客户端
    client: redis::Client,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(anyhow::Error)` - URL无效
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// 获取多路复用连接
    pub async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// 检查连接是否可用
    pub async fn ping(&self) -> Result<()> {
        let mut con = self.get_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut con).await?;
        Ok(())
    }

    /// 读取有序集合中分数严格大于 `min_exclusive` 的成员分数
    pub async fn zscores_above(&self, key: &str, min_exclusive: i64) -> Result<Vec<i64>> {
        let mut con = self.get_connection().await?;
        let members: Vec<(String, i64)> = con
            .zrangebyscore_withscores(key, format!("({}", min_exclusive), "+inf")
            .await?;
        Ok(members.into_iter().map(|(_, score)| score).collect())
    }

    /// 原子地清理过期成员、写入新成员并刷新过期时间
    ///
    /// # 参数
    ///
    /// * `key` - 有序集合键
    /// * `members` - (成员, 分数) 列表
    /// * `prune_max` - 分数不大于该值的成员会被删除
    /// * `ttl_seconds` - 键的过期时间（秒）
    pub async fn zadd_window(
        &self,
        key: &str,
        members: &[(String, i64)],
        prune_max: i64,
        ttl_seconds: i64,
    ) -> Result<()> {
        let mut con = self.get_connection().await?;
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(key)
            .arg("-inf")
            .arg(prune_max)
            .ignore();
        for (member, score) in members {
            pipe.cmd("ZADD").arg(key).arg(*score).arg(member).ignore();
        }
        pipe.cmd("EXPIRE").arg(key).arg(ttl_seconds).ignore();
        pipe.query_async::<()>(&mut con).await?;
        Ok(())
    }

    /// 追加到列表尾部并刷新过期时间
    pub async fn rpush_with_ttl(&self, key: &str, value: &str, ttl_seconds: i64) -> Result<()> {
        let mut con = self.get_connection().await?;
        redis::pipe()
            .atomic()
            .rpush(key, value)
            .ignore()
            .expire(key, ttl_seconds)
            .ignore()
            .query_async::<()>(&mut con)
            .await?;
        Ok(())
    }

    /// 读取整个列表
    pub async fn lrange_all(&self, key: &str) -> Result<Vec<String>> {
        let mut con = self.get_connection().await?;
        let values: Vec<String> = con.lrange(key, 0, -1).await?;
        Ok(values)
    }

    /// 删除键
    pub async fn del(&self, key: &str) -> Result<()> {
        let mut con = self.get_connection().await?;
        con.del::<_, ()>(key).await?;
        Ok(())
    }
}
